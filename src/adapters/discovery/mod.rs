mod file;
mod normalizer;

pub use file::{parse_installations, TomlFileSource};
pub use normalizer::{
    InstallationNormalizer, DEFAULT_DOMAIN, DEFAULT_HTTP_PORT, DEFAULT_TCP_PORT,
    MAX_GENERATED_HOSTS,
};
