mod builder;
mod codec;
mod config;
mod error;
mod pipeline;
mod table;
mod topk;

pub use builder::{CoocRecord, TableBuilder, RECORD_SIZE};
pub use codec::{dump_id_keyed, dump_item_keyed, load_id_keyed, load_item_keyed};
pub use config::{files_handling, Config, Params};
pub use error::{CoocError, Result};
pub use pipeline::Pipeline;
pub use table::{CoocTable, Entry, Item, Partner, PartnerKey};
pub use topk::TopKCollector;
