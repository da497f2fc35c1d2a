use anyhow::{Context, Result};
use log::LevelFilter;
use std::{env, path::PathBuf, sync::Arc};
use structopt::StructOpt;
use vrd_tool::{config::Config, Task};

#[derive(Debug, Clone, StructOpt)]
/// Prepare visual relationship detection datasets
enum Args {
    /// Build the image records and dump the class and predicate lists
    Records {
        #[structopt(long, default_value = "vrd.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Estimate the predicate prior given subject and object classes
    Prior {
        #[structopt(long, default_value = "vrd.json5")]
        /// configuration file
        config_file: PathBuf,
    },
    /// Produce all artifacts
    All {
        #[structopt(long, default_value = "vrd.json5")]
        /// configuration file
        config_file: PathBuf,
    },
}

#[tokio::main]
pub async fn main() -> Result<()> {
    // setup logging
    {
        let mut builder = pretty_env_logger::formatted_builder();
        builder.filter_level(LevelFilter::Info);
        if let Ok(filters) = env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        builder.init();
    }

    // parse arguments
    let (config_file, task) = match Args::from_args() {
        Args::Records { config_file } => (config_file, Task::Records),
        Args::Prior { config_file } => (config_file, Task::Prior),
        Args::All { config_file } => (config_file, Task::All),
    };
    let config = Arc::new(
        Config::open(&config_file)
            .with_context(|| format!("failed to load config file '{}'", config_file.display()))?,
    );

    // start preparation program
    vrd_tool::start(config, task).await?;

    Ok(())
}
