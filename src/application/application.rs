use colored::Colorize;
use snafu::Snafu;
use snafu::prelude::*;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::application::RuntimeConfig;
use crate::filesystem::FileSystem;
use crate::import::Importer;
use crate::shell::Shell;
use crate::shell::ShellError;

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        let mut fs = FileSystem::new();

        if let Some(path) = &app_config.import_file {
            match Importer::load(&mut fs, path).await {
                Ok(summary) => {
                    info!(
                        "Imported {} directories and {} files",
                        summary.directories, summary.files
                    );
                    println!("{}", "File system loaded successfully.".green());
                }
                Err(e) => {
                    // Whatever replayed before the failure stays in the tree.
                    error!("File system did not load: {e}");
                }
            }
        }

        debug!("Starting the shell with {} nodes", fs.len());
        Shell::new(fs).run().context(ShellSnafu)?;

        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while running the shell"))]
    ShellError { source: ShellError },
}
