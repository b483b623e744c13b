//! Command line interface definition.

use clap::{crate_version, App, Arg};

/// Generates the command line interface.
pub fn generate_cli() -> App<'static, 'static> {
    App::new("rootscan")
        .version(crate_version!())
        .about(
            "Searches apktool-decoded smali code for root detection strings and traces where \
             the detecting methods are called",
        )
        .arg(
            Arg::with_name("root")
                .help("Directory of the decoded application")
                .value_name("DIR")
                .default_value(".")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("threads")
                .short("t")
                .long("threads")
                .value_name("THREADS")
                .takes_value(true)
                .help("Sets the number of worker threads for each pass"),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .takes_value(true)
                .help("Loads the configuration from the given TOML file"),
        )
        .arg(
            Arg::with_name("signatures")
                .short("s")
                .long("signatures")
                .value_name("FILE")
                .takes_value(true)
                .help("Loads the root detection strings from a JSON array file"),
        )
        .arg(
            Arg::with_name("extension")
                .short("e")
                .long("extension")
                .value_name("EXT")
                .takes_value(true)
                .help("Extension of the source files to scan, without the dot"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .value_name("FILE")
                .takes_value(true)
                .help("Writes a JSON report of the findings to the given file"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .conflicts_with("quiet")
                .help("If you'd like the scanner to talk more than it should"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .conflicts_with("verbose")
                .help("Only findings, warnings and errors will be printed"),
        )
        .arg(
            Arg::with_name("bench")
                .long("bench")
                .help("Show benchmarks for the scan"),
        )
}
