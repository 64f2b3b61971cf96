/******************************************************************************
   Author: book-publisher contributors
   Date: 19/10/26
******************************************************************************/

//! Multi-book management with centralized publish event routing.
//!
//! This module provides the `BookManager` struct, which owns the books of one
//! publishing process together with the symbol to topic registry, and routes
//! every published recap or delta through a single channel.

use crate::config::BookConfig;
use crate::message::{BookMessage, MemoryMessage};
use crate::orderbook::OrderBook;
use crate::orderbook::error::BookError;
use crate::utils::current_time_millis;
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use tracing::{error, info};

/// A message published for one book.
#[derive(Debug, Clone)]
pub struct PublishEvent<M = MemoryMessage> {
    /// Symbol of the publishing book
    pub symbol: String,
    /// Topic registered for the symbol
    pub topic: String,
    /// Rendered recap or delta
    pub message: M,
    /// Publish time (milliseconds since epoch)
    pub timestamp: u64,
}

/// Manages multiple order books with centralized publish event routing.
pub struct BookManager<M = MemoryMessage>
where
    M: BookMessage + Send + 'static,
{
    /// Collection of order books indexed by symbol
    books: HashMap<String, OrderBook<M>>,
    /// Topic each symbol publishes on
    topics: HashMap<String, String>,
    /// Configuration applied to books created by `add_book`
    config: BookConfig,
    /// Reused output message for the publish loop
    scratch: M,
    /// Sender for publish events
    publish_sender: mpsc::Sender<PublishEvent<M>>,
    /// Receiver for publish events (taken when processor starts)
    publish_receiver: Option<mpsc::Receiver<PublishEvent<M>>>,
}

impl<M> BookManager<M>
where
    M: BookMessage + Send + 'static,
{
    /// Create a new BookManager with a publish event channel.
    pub fn new() -> Self {
        Self::with_config(BookConfig::default())
    }

    /// Create a new BookManager whose books use `config`.
    pub fn with_config(config: BookConfig) -> Self {
        let (sender, receiver) = mpsc::channel();

        Self {
            books: HashMap::new(),
            topics: HashMap::new(),
            config,
            scratch: M::default(),
            publish_sender: sender,
            publish_receiver: Some(receiver),
        }
    }

    /// Add a new order book for a symbol, publishing on `topic`.
    pub fn add_book(&mut self, symbol: &str, topic: &str) {
        let book = OrderBook::with_config(symbol, self.config.clone());
        self.books.insert(symbol.to_string(), book);
        self.topics.insert(symbol.to_string(), topic.to_string());
        info!("Added order book for symbol: {} on topic {}", symbol, topic);
    }

    /// Get a reference to an order book by symbol.
    pub fn get_book(&self, symbol: &str) -> Option<&OrderBook<M>> {
        self.books.get(symbol)
    }

    /// Get a mutable reference to an order book by symbol.
    pub fn get_book_mut(&mut self, symbol: &str) -> Option<&mut OrderBook<M>> {
        self.books.get_mut(symbol)
    }

    /// Topic registered for a symbol.
    pub fn topic(&self, symbol: &str) -> Option<&str> {
        self.topics.get(symbol).map(String::as_str)
    }

    /// Re-registers the topic a symbol publishes on.
    pub fn set_topic(&mut self, symbol: &str, topic: &str) -> Result<(), BookError> {
        if !self.books.contains_key(symbol) {
            return Err(BookError::InvalidOperation {
                message: format!("no book registered for symbol {symbol}"),
            });
        }
        self.topics.insert(symbol.to_string(), topic.to_string());
        Ok(())
    }

    /// Get the list of all symbols with order books in this manager.
    pub fn symbols(&self) -> Vec<String> {
        self.books.keys().cloned().collect()
    }

    /// Remove an order book for a specific symbol.
    pub fn remove_book(&mut self, symbol: &str) -> Option<OrderBook<M>> {
        let result = self.books.remove(symbol);
        if result.is_some() {
            self.topics.remove(symbol);
            info!("Removed order book for symbol: {}", symbol);
        }
        result
    }

    /// Check if a book exists for a specific symbol.
    pub fn has_book(&self, symbol: &str) -> bool {
        self.books.contains_key(symbol)
    }

    /// Publishes a recap of one book.
    pub fn publish_recap(&mut self, symbol: &str) -> Result<(), BookError> {
        let book = self
            .books
            .get_mut(symbol)
            .ok_or_else(|| BookError::InvalidOperation {
                message: format!("no book registered for symbol {symbol}"),
            })?;

        self.scratch.clear();
        book.populate_recap(&mut self.scratch);
        if self.scratch.num_fields() == 0 {
            return Ok(());
        }
        Self::send(&self.publish_sender, &self.topics, symbol, &self.scratch)
    }

    /// Publishes the pending delta of every book. Returns the number of
    /// messages sent.
    pub fn publish_all_deltas(&mut self) -> Result<usize, BookError> {
        let mut sent = 0;
        for (symbol, book) in &mut self.books {
            self.scratch.clear();
            if book.populate_delta(&mut self.scratch) {
                Self::send(&self.publish_sender, &self.topics, symbol, &self.scratch)?;
                sent += 1;
            }
        }
        Ok(sent)
    }

    /// Start the publish event processor in a separate thread.
    ///
    /// # Errors
    ///
    /// [`BookError::InvalidOperation`] if the processor was already started.
    pub fn start_publish_processor<F>(
        &mut self,
        mut process: F,
    ) -> Result<thread::JoinHandle<()>, BookError>
    where
        F: FnMut(PublishEvent<M>) + Send + 'static,
    {
        let receiver = self
            .publish_receiver
            .take()
            .ok_or_else(|| BookError::InvalidOperation {
                message: "Publish processor already started".to_string(),
            })?;

        Ok(thread::spawn(move || {
            info!("Publish processor started");

            while let Ok(event) = receiver.recv() {
                process(event);
            }

            info!("Publish processor stopped");
        }))
    }

    /// Get the number of order books in this manager.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    fn send(
        sender: &mpsc::Sender<PublishEvent<M>>,
        topics: &HashMap<String, String>,
        symbol: &str,
        message: &M,
    ) -> Result<(), BookError> {
        let topic = topics.get(symbol).cloned().unwrap_or_else(|| symbol.to_string());
        let event = PublishEvent {
            symbol: symbol.to_string(),
            topic,
            message: message.clone(),
            timestamp: current_time_millis(),
        };
        sender.send(event).map_err(|e| {
            error!("Failed to send publish event for {}: {}", symbol, e);
            BookError::InvalidOperation {
                message: format!("publish channel closed for {symbol}"),
            }
        })
    }
}

impl<M> Default for BookManager<M>
where
    M: BookMessage + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
