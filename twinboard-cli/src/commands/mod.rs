//! Subcommand implementations.

mod browse;
mod list;
mod patch;
mod serve;
mod show;
mod upload;

use twinboard_lib::MachinesClient;
use twinboard_lib::error::Error;

use crate::config::Cli;
use crate::config::Command;

pub async fn run(cli: Cli) -> Result<(), Error> {
    let Cli {
        api_url, command, ..
    } = cli;

    match command {
        Command::Serve(args) => serve::run(args).await,
        Command::List => list::run(&client(&api_url)?).await,
        Command::Browse(args) => browse::run(&client(&api_url)?, args).await,
        Command::Show { id } => show::run(&client(&api_url)?, id).await,
        Command::Upload { name, file } => upload::run(&client(&api_url)?, name, &file).await,
        Command::Patch {
            id,
            status,
            accuracy,
        } => patch::run(&client(&api_url)?, id, status, accuracy).await,
    }
}

fn client(api_url: &str) -> Result<MachinesClient, Error> {
    Ok(MachinesClient::new(api_url)?)
}
