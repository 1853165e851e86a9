/*
 *  main.rs
 *
 *  Aura Live
 *  (c) 2020-26 Stuart Hunter
 *
 *  Process entry point
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::info;
use env_logger::Env;
use clap::Parser;

use aura_live::config::{self, Cli};
use aura_live::{AuraError, AuraLive};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn run(cli: &Cli) -> anyhow::Result<()> {
    let cfg = config::load(cli).map_err(AuraError::from)?;

    if cli.dump_config {
        println!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_filter(cli.debug)))
        .format_timestamp_secs()
        .init();

    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);
    info!("Plugins path {}", cfg.plugins_path().display());

    let aura = AuraLive::init(&cfg)?;
    aura.log_inventory();

    if aura.plugins().is_empty() {
        info!("No plugins loaded");
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        // the logger may not be up yet if configuration failed
        eprintln!("aura-live: {:#}", e);
        let code = e.downcast_ref::<AuraError>().map(AuraError::code).unwrap_or(1);
        std::process::exit(code);
    }
}
