use crate::{entry, mirror_from_recap, px};
use book_publisher::prelude::*;

const PRICE_LEVELS: u16 = 699;
const PL_ENTRIES: u16 = 700;

#[test]
fn test_recap_of_empty_book() {
    let mut book: OrderBook = OrderBook::new("EMPTY");
    let mut msg = MemoryMessage::new();
    book.populate_recap(&mut msg);

    let fields = BookFields::default();
    assert_eq!(msg.get_u64(fields.msg_type), Some(MsgType::BookInitial.code()));
    assert_eq!(msg.get_u64(fields.num_levels), Some(0));
    assert!(!msg.has_field(PRICE_LEVELS));
    assert!(!msg.has_field(PL_ENTRIES));
    assert_eq!(msg.num_fields(), 2);
}

#[test]
fn test_single_entry_recap_reaches_mirror() {
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("jmg", 500.0), px(1000, 1), Side::Bid, 10)
        .unwrap();

    let listener = mirror_from_recap(&mut book);
    let source_level = book.level(px(1000, 1), Side::Bid).unwrap();
    let mirror_level = listener.book().level(px(1000, 1), Side::Bid).unwrap();

    assert_eq!(source_level.num_entries(), 1);
    assert_eq!(mirror_level.num_entries(), 1);
    assert_eq!(mirror_level.find_entry("jmg").unwrap().size(), 500.0);
    assert_eq!(mirror_level.size(), 500.0);
    assert_eq!(mirror_level.side(), Side::Bid);
    assert_eq!(listener.book().num_bid_levels(), 1);
    assert_eq!(listener.book().num_ask_levels(), 0);
}

#[test]
fn test_repeated_updates_publish_final_size() {
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("jmg", 500.0), px(1000, 1), Side::Bid, 10)
        .unwrap();
    let first = mirror_from_recap(&mut book);
    assert_eq!(
        first.book().level(px(1000, 1), Side::Bid).unwrap().size(),
        500.0
    );

    for time in 11..15 {
        book.update_entry("jmg", px(1000, 1), Side::Bid, 1000.0, time)
            .unwrap();
    }

    let listener = mirror_from_recap(&mut book);
    let level = listener.book().level(px(1000, 1), Side::Bid).unwrap();
    assert_eq!(level.size(), 1000.0);
    assert_eq!(level.find_entry("jmg").unwrap().size(), 1000.0);
    assert_eq!(level.num_entries(), 1);
    assert_eq!(book.level(px(1000, 1), Side::Bid).unwrap().size(), 1000.0);
}

#[test]
fn test_recap_carries_header_fields() {
    let mut book: OrderBook = OrderBook::new("ACME");
    book.set_part_id(Some("NYSE".to_string()));
    book.add_entry(entry("a", 1.0), px(100, 0), Side::Ask, 42)
        .unwrap();

    let mut msg = MemoryMessage::new();
    book.populate_recap(&mut msg);

    let fields = BookFields::default();
    assert_eq!(msg.get_str(fields.symbol), Some("ACME"));
    assert_eq!(msg.get_str(fields.part_id), Some("NYSE"));
    assert_eq!(msg.get_u64(fields.book_time), Some(42));
    assert_eq!(msg.get_char(fields.pl_side), Some('A'));
    assert!(!msg.has_field(fields.pl_time));
    assert!(!msg.has_field(fields.entry_time));
}

#[test]
fn test_recap_does_not_consume_deltas() {
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 1.0), px(100, 0), Side::Bid, 1)
        .unwrap();

    let mut msg = MemoryMessage::new();
    book.populate_recap(&mut msg);
    assert_eq!(book.delta_count(), 1);

    msg.clear();
    assert!(book.populate_delta(&mut msg));
}

#[test]
fn test_recap_replaces_mirror_state() {
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 1.0), px(100, 0), Side::Bid, 1)
        .unwrap();

    let mut listener: BookListener = BookListener::new("ACME");
    let mut msg = MemoryMessage::new();
    book.populate_recap(&mut msg);
    listener.on_message(&msg).unwrap();

    book.delete_entry("a", px(100, 0), Side::Bid, 2).unwrap();
    book.add_entry(entry("b", 2.0), px(101, 0), Side::Ask, 3)
        .unwrap();
    msg.clear();
    book.populate_recap(&mut msg);
    listener.on_message(&msg).unwrap();

    assert!(listener.book().level(px(100, 0), Side::Bid).is_none());
    assert_eq!(listener.book().total_num_levels(), 1);
    assert!(listener.book().snapshot().same_levels(&book.snapshot()));
}

#[test]
fn test_publishing_disabled() {
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 1.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    book.generate_delta_msgs(false);
    book.add_entry(entry("b", 1.0), px(101, 0), Side::Bid, 2)
        .unwrap();

    let mut msg = MemoryMessage::new();
    book.populate_recap(&mut msg);
    assert_eq!(msg.num_fields(), 0);
    assert!(!book.populate_delta(&mut msg));
    assert_eq!(msg.num_fields(), 0);
    assert_eq!(book.delta_count(), 0);

    book.generate_delta_msgs(true);
    book.populate_recap(&mut msg);
    assert_eq!(msg.get_u64(BookFields::default().num_levels), Some(2));
}

#[test]
fn test_publishing_disabled_through_config() {
    let config = BookConfig::new().with_generate_delta_msgs(false);
    let mut book: OrderBook = OrderBook::with_config("ACME", config);
    book.add_entry(entry("a", 1.0), px(100, 0), Side::Bid, 1)
        .unwrap();

    let mut msg = MemoryMessage::new();
    book.populate_recap(&mut msg);
    assert_eq!(msg.num_fields(), 0);
    assert!(!book.populate_delta(&mut msg));
}
