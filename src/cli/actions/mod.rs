pub mod server;
pub mod token;

/// What one invocation of the binary should do.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// No arguments at all: prompt for pool and stage, print and copy.
    Interactive,
    /// Single-shot token delivery; missing pool or stage is prompted for.
    Token {
        pool: Option<String>,
        stage: Option<String>,
        copy: bool,
        code: Option<String>,
    },
    /// Run the HTTP token server; port falls back to config, then 8080.
    Server { port: Option<u16> },
}
