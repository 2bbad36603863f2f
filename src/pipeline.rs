// imports
use std::env;
use std::io::Write;
use std::time::Instant;

use log::info;
use rayon::ThreadPoolBuilder;

use crate::builder::TableBuilder;
use crate::codec;
use crate::config::{files_handling, Config, Params};
use crate::error::{CoocError, Result};

pub struct Pipeline {}

impl Pipeline {
    // runs the whole procedure -
    // -> configuration of arguments
    // -> mode dispatch: build a table, or convert one between its two layouts

    pub fn run() -> Result<()> {
        let args: Vec<String> = env::args().collect();
        let params = Config::new(&args)?.get_params();
        info!("{}", params);

        ThreadPoolBuilder::new()
            .num_threads(params.num_threads)
            .build_global()
            .map_err(|e| CoocError::config(format!("cannot build thread pool: {}", e)))?;

        match params.mode.as_str() {
            "build" => Self::build(&params),
            "item2id" => Self::item_to_id(&params),
            "id2item" => Self::id_to_item(&params),
            other => Err(CoocError::config(format!("unknown mode {:?}", other))),
        }
    }

    pub fn build(params: &Params) -> Result<()> {
        let timer = Instant::now();
        let table = TableBuilder::run(params)?;
        info!(
            "built table of {} entries, took {} seconds",
            table.len() - 1,
            timer.elapsed().as_secs()
        );

        // the output endpoint is only opened once construction succeeded
        let mut writer = files_handling::open_output(&params.output_file)?;
        match params.output_format.as_str() {
            "item" => codec::dump_item_keyed(&table, &mut writer)?,
            _ => codec::dump_id_keyed(&table, &mut writer)?,
        }
        writer.flush()?;
        Ok(())
    }

    pub fn item_to_id(params: &Params) -> Result<()> {
        let timer = Instant::now();
        let reader = files_handling::open_input(&params.input_file)?;
        let table = codec::load_item_keyed(reader)?;
        info!("loaded {} entries from {}", table.len() - 1, params.input_file);

        let mut writer = files_handling::open_output(&params.output_file)?;
        codec::dump_id_keyed(&table, &mut writer)?;
        writer.flush()?;
        info!("converted to id-keyed, took {} seconds", timer.elapsed().as_secs());
        Ok(())
    }

    pub fn id_to_item(params: &Params) -> Result<()> {
        let timer = Instant::now();
        let reader = files_handling::open_input(&params.input_file)?;
        let table = codec::load_id_keyed(reader)?;
        info!("loaded {} entries from {}", table.len() - 1, params.input_file);

        let mut writer = files_handling::open_output(&params.output_file)?;
        codec::dump_item_keyed(&table, &mut writer)?;
        writer.flush()?;
        info!("converted to item-keyed, took {} seconds", timer.elapsed().as_secs());
        Ok(())
    }
}
