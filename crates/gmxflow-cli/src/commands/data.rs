use crate::cli::{DataArgs, DataCommands};
use crate::data::{self, DataManager};
use crate::error::Result;
use std::path::PathBuf;
use tracing::info;

pub fn run(args: DataArgs) -> Result<()> {
    match args.command {
        DataCommands::FetchMdp { gmx_version, force } => {
            handle_fetch_mdp(&gmx_version, force)?;
        }
        DataCommands::Path => {
            handle_path()?;
        }
        DataCommands::SetPath { path } => {
            handle_set_path(path)?;
        }
        DataCommands::ResetPath => {
            handle_reset_path()?;
        }
    }
    Ok(())
}

fn handle_fetch_mdp(gmx_version: &str, force: bool) -> Result<()> {
    let manager = DataManager::new()?;
    let options = manager.mdp_options(gmx_version, force, &data::fetch_html)?;

    println!(
        "{} mdp option(s) known for GROMACS {}:",
        options.len(),
        gmx_version
    );
    for option in &options {
        println!("  {option}");
    }
    Ok(())
}

fn handle_path() -> Result<()> {
    let manager = DataManager::new()?;
    println!("{}", manager.get_data_path().display());
    Ok(())
}

fn handle_set_path(path: PathBuf) -> Result<()> {
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };
    DataManager::set_custom_path(&absolute)?;
    info!("Custom data path recorded: {:?}", absolute);
    println!("Data path set to: {}", absolute.display());
    Ok(())
}

fn handle_reset_path() -> Result<()> {
    DataManager::reset_path()?;
    let manager = DataManager::new()?;
    println!(
        "Data path reset to default: {}",
        manager.get_data_path().display()
    );
    Ok(())
}
