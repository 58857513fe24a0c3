use std::path::Path;

use chrono::Local;

use offline_planner::ItemStore;
use offline_planner::storage::FileStorage;

const DEFAULT_STORAGE_FILE: &str = "planner.json";


fn main() {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_STORAGE_FILE.to_string());
    let store = ItemStore::new(FileStorage::open(Path::new(&path)));

    let today = Local::now();
    match store.get_items_from_day(&today) {
        Err(err) => log::error!("Unable to read items from {}: {}", path, err),
        Ok(items) => {
            println!("---- {} -----", today.format("%Y-%m-%d"));
            offline_planner::utils::print_item_list(&items);
        },
    }
}
