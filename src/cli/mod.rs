mod args;

pub use args::{
    CliArgs, CommandKind, CompletionsArgs, ConfigArgs, OrderArgs, OutputFlags, build_cli,
};

pub fn parse() -> CliArgs {
    args::parse_args()
}
