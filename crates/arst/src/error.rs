use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArstError {
    #[error(
        "Async reset {trigger} yields endless loop at value {value} for signal {target} \
         in `{module}.{process}` (gave up after {iterations} iterations)"
    )]
    NonConvergent {
        module: String,
        process: String,
        trigger: String,
        target: String,
        value: String,
        iterations: usize,
    },

    #[error(
        "Async reset {trigger} yields non-constant value {value} for signal {target} \
         in `{module}.{process}`"
    )]
    NonConstant {
        module: String,
        process: String,
        trigger: String,
        target: String,
        value: String,
    },

    #[error("Invalid global reset net name `{0}`")]
    InvalidGlobalReset(String),

    #[error("Invalid pass options: {0}")]
    Config(#[from] toml::de::Error),
}
