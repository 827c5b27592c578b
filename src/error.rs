use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Template(#[from] indicatif::style::TemplateError),
    #[error("{name} must be greater than zero")]
    NonPositive { name: &'static str },
}
