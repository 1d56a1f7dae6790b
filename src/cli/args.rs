use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};

#[derive(Debug, Clone)]
pub struct OutputFlags {
    pub json: bool,
    pub markdown: bool,
    pub pretty: bool,
}

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    pub profile: Option<String>,
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_ms: Option<u64>,
    pub encrypt: Option<bool>,
    pub trust_cert: Option<bool>,
    pub output: OutputFlags,
    pub verbose: u8,
    pub quiet: bool,
    pub command: CommandKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Order(OrderArgs),
    Config(ConfigArgs),
    Completions(CompletionsArgs),
}

/// Flags of `order`. Boolean flags only switch options on; the rest comes
/// from `settings.scripting` in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderArgs {
    pub manifest: PathBuf,
    pub urns: Vec<String>,
    pub data: bool,
    pub data_only: bool,
    pub associations: bool,
    pub owner: bool,
    pub permissions: bool,
    pub behavior: Option<String>,
    pub design_mode: bool,
    pub filestream: bool,
    pub csv: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigArgs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionsArgs {
    pub shell: Option<String>,
}

pub fn build_cli() -> Command {
    let mut cmd = Command::new("sqlorder")
        .about("Dependency-safe scripting order for SQL Server objects")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand_value_name("COMMAND");

    cmd = add_global_args(cmd);

    cmd = cmd.subcommand(command_order());
    cmd = cmd.subcommand(command_config());
    cmd = cmd.subcommand(command_completions());

    cmd
}

pub fn parse_args() -> CliArgs {
    let matches = build_cli().get_matches();
    parse_matches(&matches)
}

fn add_global_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("config")
            .long("config")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("Override config file location"),
    )
    .arg(
        Arg::new("env-file")
            .long("env-file")
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .global(true)
            .help("Load environment variables from file (default: .env)"),
    )
    .arg(
        Arg::new("profile")
            .long("profile")
            .value_name("NAME")
            .global(true)
            .help("Select connection profile"),
    )
    .arg(
        Arg::new("server")
            .long("server")
            .value_name("HOST")
            .global(true)
            .help("SQL Server hostname"),
    )
    .arg(
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .value_parser(clap::value_parser!(u16))
            .global(true)
            .help("SQL Server port (default: 1433)"),
    )
    .arg(
        Arg::new("database")
            .long("database")
            .value_name("NAME")
            .global(true)
            .help("Database used for the initial login (default: master)"),
    )
    .arg(
        Arg::new("user")
            .long("user")
            .value_name("USER")
            .global(true)
            .help("SQL Server username"),
    )
    .arg(
        Arg::new("password")
            .long("password")
            .value_name("PASS")
            .global(true)
            .help("SQL Server password"),
    )
    .arg(
        Arg::new("timeout")
            .long("timeout")
            .value_name("MS")
            .value_parser(clap::value_parser!(u64))
            .global(true)
            .help("Connection timeout in milliseconds"),
    )
    .arg(
        Arg::new("encrypt")
            .long("encrypt")
            .value_parser(clap::value_parser!(bool))
            .global(true)
            .help("Enable connection encryption"),
    )
    .arg(
        Arg::new("trust-cert")
            .long("trust-cert")
            .value_parser(clap::value_parser!(bool))
            .global(true)
            .help("Trust server certificate"),
    )
    .arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Output as JSON"),
    )
    .arg(
        Arg::new("markdown")
            .long("markdown")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Force markdown table output"),
    )
    .arg(
        Arg::new("pretty")
            .long("pretty")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Force pretty-printed table output"),
    )
    .arg(
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .action(ArgAction::Count)
            .global(true)
            .help("Enable debug logging (repeat for more)"),
    )
    .arg(
        Arg::new("quiet")
            .short('q')
            .long("quiet")
            .action(ArgAction::SetTrue)
            .global(true)
            .help("Suppress non-error output"),
    )
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn command_order() -> Command {
    Command::new("order")
        .about("Order objects from a manifest for scripting")
        .visible_alias("sort")
        .arg(
            Arg::new("manifest")
                .long("manifest")
                .short('m')
                .value_name("PATH")
                .value_hint(ValueHint::FilePath)
                .required(true)
                .help("YAML or JSON file listing objects and their metadata"),
        )
        .arg(
            Arg::new("urn")
                .value_name("URN")
                .action(ArgAction::Append)
                .help("Objects to order (default: every manifest object)"),
        )
        .arg(flag("data", "Script table data after the schema"))
        .arg(
            flag("data-only", "Script table data only, ordered by foreign keys")
                .conflicts_with("data"),
        )
        .arg(flag("associations", "Script database role memberships"))
        .arg(flag("owner", "Script ownership changes"))
        .arg(flag("permissions", "Script permissions"))
        .arg(
            Arg::new("behavior")
                .long("behavior")
                .value_name("KIND")
                .value_parser(["create", "alter", "drop", "create-drop"])
                .help("Statements to script (default: create)"),
        )
        .arg(flag("design-mode", "Embed constraints of a lone table"))
        .arg(flag("filestream", "Script filestream columns with table data"))
        .arg(
            Arg::new("csv")
                .long("csv")
                .value_name("file")
                .value_hint(ValueHint::FilePath)
                .help("Also write the order to a CSV file"),
        )
}

fn command_config() -> Command {
    Command::new("config").about("Display resolved config")
}

fn command_completions() -> Command {
    Command::new("completions")
        .about("Generate shell completions")
        .arg(
            Arg::new("shell")
                .long("shell")
                .value_name("name")
                .value_parser(["bash", "zsh", "fish", "powershell", "elvish"]),
        )
}

fn parse_matches(matches: &ArgMatches) -> CliArgs {
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let env_file = matches.get_one::<String>("env-file").map(PathBuf::from);
    let profile = matches.get_one::<String>("profile").cloned();
    let server = matches.get_one::<String>("server").cloned();
    let port = matches.get_one::<u16>("port").copied();
    let database = matches.get_one::<String>("database").cloned();
    let user = matches.get_one::<String>("user").cloned();
    let password = matches.get_one::<String>("password").cloned();
    let timeout_ms = matches.get_one::<u64>("timeout").copied();
    let encrypt = matches.get_one::<bool>("encrypt").copied();
    let trust_cert = matches.get_one::<bool>("trust-cert").copied();
    let output = OutputFlags {
        json: matches.get_flag("json"),
        markdown: matches.get_flag("markdown"),
        pretty: matches.get_flag("pretty"),
    };
    let verbose = matches.get_count("verbose");
    let quiet = matches.get_flag("quiet");

    let command = match matches.subcommand() {
        Some(("order", sub_m)) => CommandKind::Order(OrderArgs {
            manifest: sub_m
                .get_one::<String>("manifest")
                .map(PathBuf::from)
                .unwrap_or_default(),
            urns: sub_m
                .get_many::<String>("urn")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            data: sub_m.get_flag("data"),
            data_only: sub_m.get_flag("data-only"),
            associations: sub_m.get_flag("associations"),
            owner: sub_m.get_flag("owner"),
            permissions: sub_m.get_flag("permissions"),
            behavior: sub_m.get_one::<String>("behavior").cloned(),
            design_mode: sub_m.get_flag("design-mode"),
            filestream: sub_m.get_flag("filestream"),
            csv: sub_m.get_one::<String>("csv").map(PathBuf::from),
        }),
        Some(("completions", sub_m)) => CommandKind::Completions(CompletionsArgs {
            shell: sub_m.get_one::<String>("shell").cloned(),
        }),
        _ => CommandKind::Config(ConfigArgs),
    };

    CliArgs {
        config_path,
        env_file,
        profile,
        server,
        port,
        database,
        user,
        password,
        timeout_ms,
        encrypt,
        trust_cert,
        output,
        verbose,
        quiet,
        command,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> CliArgs {
        let matches = build_cli().try_get_matches_from(argv).expect("parse args");
        parse_matches(&matches)
    }

    #[test]
    fn cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn parses_order_flags_and_urns() {
        let args = parse(&[
            "sqlorder",
            "-vv",
            "order",
            "--manifest",
            "objects.yaml",
            "--data",
            "--behavior",
            "drop",
            "Server[@Name='a']",
            "Server[@Name='b']",
        ]);
        assert_eq!(args.verbose, 2);
        let CommandKind::Order(order) = args.command else {
            panic!("expected order command");
        };
        assert_eq!(order.manifest, PathBuf::from("objects.yaml"));
        assert_eq!(order.urns.len(), 2);
        assert!(order.data);
        assert!(!order.data_only);
        assert_eq!(order.behavior.as_deref(), Some("drop"));
    }

    #[test]
    fn data_and_data_only_conflict() {
        let result = build_cli().try_get_matches_from([
            "sqlorder",
            "order",
            "-m",
            "x.yaml",
            "--data",
            "--data-only",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let args = parse(&["sqlorder", "config", "--json", "--profile", "prod"]);
        assert!(args.output.json);
        assert_eq!(args.profile.as_deref(), Some("prod"));
        assert_eq!(args.command, CommandKind::Config(ConfigArgs));
    }
}
