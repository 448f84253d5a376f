pub mod path_security;

pub use path_security::{
    validate_import_path, validate_import_path_within, PathSecurityError, PathValidator, SecurePath,
    INPUT_EXTENSIONS,
};
