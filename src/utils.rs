//! Some utility functions

use crate::Item;

/// A debug utility that pretty-prints an item
pub fn print_item(item: &Item) {
    match item {
        Item::Task(task) => {
            let completion = if task.done() { "✓" } else { " " };
            println!("    [{}] {}\t{}", completion, task.name(), task.id());
        },
        Item::Note(note) => {
            println!("     -  {}\t{}", note.name(), note.id());
        },
        Item::Event(event) => {
            let time = match event.time() {
                Some(time) => time.format("%H:%M").to_string(),
                None => String::from("--:--"),
            };
            println!("    {} {}\t{}", time, event.name(), event.id());
        },
    }
    if let Some(description) = item.description() {
        println!("          {}", description);
    }
}

/// A debug utility that pretty-prints a list of items
pub fn print_item_list(items: &[Item]) {
    if items.is_empty() {
        println!("    (nothing)");
    }
    for item in items {
        print_item(item);
    }
}
