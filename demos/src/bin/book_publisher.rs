//! Publishes two books through a `BookManager` and mirrors them on the
//! processor thread.
//!
//! This example shows how to:
//! 1. Register books with the topic they publish on
//! 2. Send an initial recap followed by deltas through the publish channel
//! 3. Rebuild each book on the consuming side with a `BookListener`

use book_publisher::prelude::{
    Action, BookListener, BookManager, BookMessage, Entry, MemoryMessage, OrderBook, PublishEvent,
    Side,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, warn};

fn seed(book: &mut OrderBook, mid: i64) {
    for i in 1..=3 {
        let bid = Decimal::new(mid - i, 2);
        let ask = Decimal::new(mid + i, 2);
        for n in 0..i {
            let id = format!("b{i}{n}");
            if let Err(e) = book.add_entry(Entry::new(id, 100.0, Action::Add, 1), bid, Side::Bid, 1) {
                warn!("Failed to add bid entry: {}", e);
            }
            let id = format!("a{i}{n}");
            if let Err(e) = book.add_entry(Entry::new(id, 100.0, Action::Add, 1), ask, Side::Ask, 1) {
                warn!("Failed to add ask entry: {}", e);
            }
        }
    }
}

fn churn(book: &mut OrderBook, mid: i64, time: u64) {
    let best_bid = Decimal::new(mid - 1, 2);
    let best_ask = Decimal::new(mid + 1, 2);

    if let Err(e) = book.update_entry("b10", best_bid, Side::Bid, 40.0 + time as f64, time) {
        warn!("Failed to update entry: {}", e);
    }
    if time % 2 == 0 {
        if let Err(e) = book.delete_entry("a10", best_ask, Side::Ask, time) {
            warn!("Failed to delete entry: {}", e);
        }
    } else if let Err(e) = book.add_entry(
        Entry::new("a10", 75.0, Action::Add, time),
        best_ask,
        Side::Ask,
        time,
    ) {
        warn!("Failed to add entry: {}", e);
    }
}

fn mirror(listeners: &mut HashMap<String, BookListener>, event: PublishEvent<MemoryMessage>) {
    let listener = listeners
        .entry(event.symbol.clone())
        .or_insert_with(|| BookListener::new(&event.symbol));

    match serde_json::to_string(&event.message) {
        Ok(json) => info!("{} <- {} fields: {}", event.topic, event.message.num_fields(), json),
        Err(e) => warn!("Failed to render message: {}", e),
    }

    if let Err(e) = listener.on_message(&event.message) {
        warn!("Dropped message for {}: {}", event.symbol, e);
        return;
    }

    let book = listener.book();
    info!(
        "{} mirror: {} bid levels, {} ask levels, seq {}, consistent {}",
        book.symbol(),
        book.num_bid_levels(),
        book.num_ask_levels(),
        book.seq_num(),
        listener.is_consistent()
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting book publisher example");

    let mut manager: BookManager = BookManager::new();
    let books = [("ACME", 10_000), ("GLOBEX", 5_000)];
    for (symbol, _) in &books {
        manager.add_book(symbol, &format!("md.{symbol}"));
    }

    let mut listeners: HashMap<String, BookListener> = HashMap::new();
    let processor = manager.start_publish_processor(move |event| mirror(&mut listeners, event))?;

    for (symbol, mid) in &books {
        if let Some(book) = manager.get_book_mut(symbol) {
            seed(book, *mid);
            book.clear_delta_list();
        }
        manager.publish_recap(symbol)?;
    }

    for time in 2..6 {
        for (symbol, mid) in &books {
            if let Some(book) = manager.get_book_mut(symbol) {
                churn(book, *mid, time);
            }
        }
        let sent = manager.publish_all_deltas()?;
        info!("Round {}: published {} deltas", time, sent);
    }

    for symbol in manager.symbols() {
        if let Some(book) = manager.get_book(&symbol) {
            let snapshot = book.snapshot();
            info!(
                "{} source: best bid {:?}, best ask {:?}, spread {:?}",
                symbol,
                snapshot.best_bid(),
                snapshot.best_ask(),
                snapshot.spread()
            );
        }
    }

    drop(manager);
    if processor.join().is_err() {
        warn!("Publish processor panicked");
    }

    info!("Book publisher example completed");
    Ok(())
}
