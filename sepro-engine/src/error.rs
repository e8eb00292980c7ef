/// Errors reported while populating a container from a model
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Can not instantiate '{0}': no such concept")]
    UnknownConcept(String),

    #[error("Unknown world '{0}'")]
    UnknownWorld(String),
}
