use clap::{Arg, Command};
use griffith::app_logic;
use log::error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("Griffith")
        .version("0.1.0")
        .about("Crack growth and fracture stability assessment as code in Rust")
        .subcommand_required(true)
        .subcommand(
            Command::new("run").about("Run the analyses in a job file").arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .help("Path to a YAML or TOML job file")
                    .required(true),
            ),
        )
        .subcommand(
            Command::new("request")
                .about("Send a JSON body to a request route")
                .arg(Arg::new("route").help("Route such as /calculate-fatigue").required(true))
                .arg(Arg::new("body").help("Path to the JSON request body")),
        )
        .subcommand(Command::new("materials").about("List the material registry"))
        .after_help(
            "Set RUST_LOG=debug to trace quadrature and instability sweeps. \
             Output is printed as JSON on stdout.",
        )
        .get_matches();

    let output = match matches.subcommand() {
        Some(("run", sub)) => match sub.get_one::<String>("config") {
            Some(path) => app_logic::run(path).and_then(|summary| Ok(serde_json::to_value(summary)?)),
            None => unreachable!("config is required"),
        },
        Some(("request", sub)) => match sub.get_one::<String>("route") {
            Some(route) => app_logic::request(route, sub.get_one::<String>("body").map(|s| s.as_str())),
            None => unreachable!("route is required"),
        },
        Some(("materials", _)) => app_logic::materials(),
        _ => unreachable!("a subcommand is required"),
    };

    match output.and_then(|value| Ok(serde_json::to_string_pretty(&value)?)) {
        Ok(text) => println!("{}", text),
        Err(err) => {
            error!("{:#}", err);
            std::process::exit(1);
        }
    }
}
