use crate::{entry, px};
use book_publisher::prelude::*;

fn fields() -> BookFields {
    BookFields::default()
}

#[test]
fn test_empty_delta_returns_false() {
    let mut book: OrderBook = OrderBook::new("ACME");
    let mut msg = MemoryMessage::new();
    assert!(!book.populate_delta(&mut msg));
    assert_eq!(msg.num_fields(), 0);

    book.add_entry(entry("a", 1.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    assert!(book.populate_delta(&mut msg));

    msg.clear();
    assert!(!book.populate_delta(&mut msg));
    assert_eq!(msg.num_fields(), 0);
}

#[test]
fn test_size_change_is_net_since_last_publish() {
    let f = fields();
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 100.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    let mut msg = MemoryMessage::new();
    assert!(book.populate_delta(&mut msg));
    assert_eq!(msg.get_f64(f.pl_size_change), Some(100.0));

    book.update_entry("a", px(100, 0), Side::Bid, 80.0, 2).unwrap();
    book.update_entry("a", px(100, 0), Side::Bid, 60.0, 3).unwrap();
    msg.clear();
    assert!(book.populate_delta(&mut msg));
    assert_eq!(msg.get_f64(f.pl_size), Some(60.0));
    assert_eq!(msg.get_f64(f.pl_size_change), Some(-40.0));
    assert_eq!(
        book.level(px(100, 0), Side::Bid).unwrap().size_change(),
        0.0
    );
}

#[test]
fn test_last_entry_delete_clears_level() {
    let f = fields();
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 100.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    book.clear_delta_list();

    let deleted = book.delete_entry("a", px(100, 0), Side::Bid, 2).unwrap();
    assert_eq!(deleted.action(), Action::Delete);
    assert_eq!(book.total_num_levels(), 0);

    let mut msg = MemoryMessage::new();
    assert!(book.populate_delta(&mut msg));
    assert_eq!(msg.get_char(f.pl_action), Some('D'));
    assert_eq!(msg.get_u64(f.pl_num_attach), Some(0));
    assert_eq!(msg.get_f64(f.pl_size), Some(0.0));
    assert_eq!(msg.get_f64(f.pl_size_change), Some(-100.0));
    assert!(!msg.has_field(f.entry_id));
}

#[test]
fn test_partial_delete_updates_level_size() {
    let f = fields();
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 100.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    book.add_entry(entry("b", 50.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    book.clear_delta_list();

    book.delete_entry("a", px(100, 0), Side::Bid, 2).unwrap();
    let mut msg = MemoryMessage::new();
    assert!(book.populate_delta(&mut msg));

    assert_eq!(msg.get_char(f.pl_action), Some('U'));
    assert_eq!(msg.get_f64(f.pl_size), Some(50.0));
    assert_eq!(msg.get_f64(f.pl_size_change), Some(-100.0));
    assert_eq!(msg.get_str(f.entry_id), Some("a"));
    assert_eq!(msg.get_char(f.entry_action), Some('D'));
}

#[test]
fn test_remove_entry_publishes_like_delete() {
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 100.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    book.add_entry(entry("b", 50.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    book.clear_delta_list();

    let removed = book.remove_entry_by_id("b", px(100, 0), Side::Bid, 2).unwrap();
    assert_eq!(removed.action(), Action::Add);
    assert_eq!(book.delta_count(), 1);
    let record = &book.pending_deltas().levels()[0];
    assert_eq!(record.entries()[0].action(), Action::Delete);
}

#[test]
fn test_manual_clear_policy_keeps_deltas() {
    let config = BookConfig::new().with_clear_policy(DeltaClearPolicy::Manual);
    let mut book: OrderBook = OrderBook::with_config("ACME", config);
    book.add_entry(entry("a", 1.0), px(100, 0), Side::Bid, 1)
        .unwrap();

    let mut msg = MemoryMessage::new();
    assert!(book.populate_delta(&mut msg));
    msg.clear();
    assert!(book.populate_delta(&mut msg));

    book.clear_delta_list();
    msg.clear();
    assert!(!book.populate_delta(&mut msg));
}

#[test]
fn test_sequence_numbers_increment_per_delta() {
    let f = fields();
    let mut book: OrderBook = OrderBook::new("ACME");
    let mut msg = MemoryMessage::new();

    for (expected, size) in [(1u64, 1.0), (2, 2.0), (3, 3.0)] {
        if expected == 1 {
            book.add_entry(entry("a", size), px(100, 0), Side::Bid, 1)
                .unwrap();
        } else {
            book.update_entry("a", px(100, 0), Side::Bid, size, expected)
                .unwrap();
        }
        msg.clear();
        assert!(book.populate_delta(&mut msg));
        assert_eq!(msg.get_u64(f.seq_num), Some(expected));
    }
    assert_eq!(book.seq_num(), 3);
}

#[test]
fn test_scratch_vectors_do_not_leak_between_publishes() {
    let f = fields();
    let mut book: OrderBook = OrderBook::new("ACME");
    for (i, price) in [100, 101, 102].into_iter().enumerate() {
        book.add_entry(entry(&format!("e{i}"), 1.0), px(price, 0), Side::Bid, 1)
            .unwrap();
    }
    let mut msg = MemoryMessage::new();
    assert!(book.populate_delta(&mut msg));
    assert_eq!(msg.vector_len(f.price_levels), 3);

    book.update_entry("e0", px(100, 0), Side::Bid, 5.0, 2).unwrap();
    book.update_entry("e1", px(101, 0), Side::Bid, 5.0, 2).unwrap();
    msg.clear();
    assert!(book.populate_delta(&mut msg));
    let levels = msg.get_msg_vector(f.price_levels).unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].get_price(f.pl_price), Some(px(100, 0)));
    assert_eq!(levels[1].get_price(f.pl_price), Some(px(101, 0)));
    assert_eq!(msg.get_u64(f.num_levels), Some(2));
}

#[test]
fn test_delta_omits_times_matching_book_time() {
    let f = fields();
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 1.0), px(100, 0), Side::Bid, 5)
        .unwrap();
    book.add_entry(entry("b", 1.0), px(99, 0), Side::Bid, 9)
        .unwrap();

    let mut msg = MemoryMessage::new();
    assert!(book.populate_delta(&mut msg));
    assert_eq!(msg.get_u64(f.book_time), Some(9));
    let levels = msg.get_msg_vector(f.price_levels).unwrap();
    assert_eq!(levels[0].get_u64(f.pl_time), Some(5));
    assert!(!levels[1].has_field(f.pl_time));
}

#[test]
fn test_src_time_written_when_set() {
    let f = fields();
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 1.0), px(100, 0), Side::Bid, 5)
        .unwrap();
    let mut msg = MemoryMessage::new();
    assert!(book.populate_delta(&mut msg));
    assert!(!msg.has_field(f.src_time));

    book.set_src_time(77);
    book.update_entry("a", px(100, 0), Side::Bid, 2.0, 6).unwrap();
    msg.clear();
    assert!(book.populate_delta(&mut msg));
    assert_eq!(msg.get_u64(f.src_time), Some(77));
}

#[test]
fn test_created_level_changes_reach_delta() {
    let mut book: OrderBook = OrderBook::new("ACME");
    book.add_entry(entry("a", 10.0), px(100, 0), Side::Bid, 1)
        .unwrap();
    let mut mirror = crate::mirror_from_recap(&mut book);
    book.clear_delta_list();

    let level = book.find_or_create_level(px(100, 0), Side::Bid);
    assert_eq!(level.num_entries(), 1);
    assert_eq!(book.delta_count(), 0);

    book.add_entry(entry("b", 5.0), px(100, 0), Side::Bid, 2)
        .unwrap();
    book.update_entry("a", px(100, 0), Side::Bid, 99.0, 2)
        .unwrap();
    assert_eq!(
        book.level(px(100, 0), Side::Bid).unwrap().size_change(),
        94.0
    );

    let mut msg = MemoryMessage::new();
    assert!(book.populate_delta(&mut msg));
    mirror.on_message(&msg).unwrap();

    let level = mirror.book().level(px(100, 0), Side::Bid).unwrap();
    assert_eq!(level.size(), 104.0);
    assert_eq!(level.num_entries(), 2);
    assert!(mirror.book().snapshot().same_levels(&book.snapshot()));
}
