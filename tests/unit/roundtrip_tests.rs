//! Property tests: a listener fed every published delta holds the same
//! ladder as the source book, and so does one built from a fresh recap.

use book_publisher::prelude::*;
use proptest::prelude::*;
use rust_decimal_macros::dec;

const PRICES: [Price; 4] = [dec!(99.5), dec!(100.0), dec!(100.25), dec!(101)];
const IDS: [&str; 4] = ["jmg", "abc", "xyz", "mm1"];

#[derive(Debug, Clone)]
enum Op {
    Add { id: usize, price: usize, side: Side, size: u32 },
    Update { id: usize, price: usize, side: Side, size: u32 },
    Delete { id: usize, price: usize, side: Side },
    Remove { id: usize, price: usize, side: Side },
    AddLevel { price: usize, side: Side, size: u32 },
    UpdateLevel { price: usize, side: Side, size: u32 },
    DeleteLevel { price: usize, side: Side },
    Clear,
    Publish,
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Bid), Just(Side::Ask)]
}

fn arb_price() -> impl Strategy<Value = usize> {
    0..PRICES.len()
}

fn arb_id() -> impl Strategy<Value = usize> {
    0..IDS.len()
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (arb_id(), arb_price(), arb_side(), 1u32..500)
            .prop_map(|(id, price, side, size)| Op::Add { id, price, side, size }),
        4 => (arb_id(), arb_price(), arb_side(), 0u32..500)
            .prop_map(|(id, price, side, size)| Op::Update { id, price, side, size }),
        3 => (arb_id(), arb_price(), arb_side())
            .prop_map(|(id, price, side)| Op::Delete { id, price, side }),
        2 => (arb_id(), arb_price(), arb_side())
            .prop_map(|(id, price, side)| Op::Remove { id, price, side }),
        1 => (arb_price(), arb_side(), 0u32..500)
            .prop_map(|(price, side, size)| Op::AddLevel { price, side, size }),
        1 => (arb_price(), arb_side(), 0u32..500)
            .prop_map(|(price, side, size)| Op::UpdateLevel { price, side, size }),
        1 => (arb_price(), arb_side())
            .prop_map(|(price, side)| Op::DeleteLevel { price, side }),
        1 => Just(Op::Clear),
        4 => Just(Op::Publish),
    ]
}

/// Applies `op` at `time`. Rejected mutations leave the book untouched, so
/// their errors are not interesting here.
fn apply(book: &mut OrderBook, op: &Op, time: u64) {
    let _ = match *op {
        Op::Add { id, price, side, size } => book.add_entry(
            Entry::new(IDS[id], f64::from(size), Action::Add, time),
            PRICES[price],
            side,
            time,
        ),
        Op::Update { id, price, side, size } => {
            book.update_entry(IDS[id], PRICES[price], side, f64::from(size), time)
        }
        Op::Delete { id, price, side } => book
            .delete_entry(IDS[id], PRICES[price], side, time)
            .map(|_| ()),
        Op::Remove { id, price, side } => book
            .remove_entry_by_id(IDS[id], PRICES[price], side, time)
            .map(|_| ()),
        Op::AddLevel { price, side, size } => book.add_level(PriceLevel::with_size(
            PRICES[price],
            side,
            f64::from(size),
            time,
        )),
        Op::UpdateLevel { price, side, size } => {
            book.update_level(PRICES[price], side, f64::from(size), time)
        }
        Op::DeleteLevel { price, side } => book.delete_level(PRICES[price], side, time).map(|_| ()),
        Op::Clear => {
            book.clear();
            Ok(())
        }
        Op::Publish => Ok(()),
    };
}

fn publish_delta(book: &mut OrderBook, listener: &mut BookListener, msg: &mut MemoryMessage) {
    msg.clear();
    if book.populate_delta(msg) {
        listener.on_message(msg).unwrap();
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_mirror_tracks_source(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut book: OrderBook = OrderBook::new("PROP");
        let mut listener: BookListener = BookListener::new("PROP");
        let mut msg = MemoryMessage::new();

        for (i, op) in ops.iter().enumerate() {
            let time = i as u64 + 1;
            if let Op::Publish = op {
                publish_delta(&mut book, &mut listener, &mut msg);
                prop_assert!(listener.book().snapshot().same_levels(&book.snapshot()));
                prop_assert_eq!(listener.book().seq_num(), book.seq_num());
            } else {
                apply(&mut book, op, time);
            }
            prop_assert_eq!(
                book.total_num_levels(),
                book.num_bid_levels() + book.num_ask_levels()
            );
        }

        publish_delta(&mut book, &mut listener, &mut msg);
        prop_assert!(listener.book().snapshot().same_levels(&book.snapshot()));
        prop_assert_eq!(listener.gap_count(), 0);

        msg.clear();
        book.populate_recap(&mut msg);
        let mut fresh: BookListener = BookListener::new("PROP");
        fresh.on_message(&msg).unwrap();
        prop_assert!(fresh.book().snapshot().same_levels(&book.snapshot()));
        prop_assert_eq!(book.check_equal(fresh.book()), Ok(()));
    }

    #[test]
    fn prop_no_empty_levels_after_entry_deletes(
        ops in prop::collection::vec(arb_op(), 1..60)
    ) {
        let mut book: OrderBook = OrderBook::new("PROP");
        for (i, op) in ops.iter().enumerate() {
            let had_entries = matches!(
                op,
                Op::Delete { price, side, .. } | Op::Remove { price, side, .. }
                    if book.level(PRICES[*price], *side).is_some_and(|l| !l.is_empty())
            );
            apply(&mut book, op, i as u64 + 1);
            if had_entries
                && let Op::Delete { price, side, .. } | Op::Remove { price, side, .. } = op
                && let Some(level) = book.level(PRICES[*price], *side)
            {
                prop_assert!(!level.is_empty());
            }
        }
    }
}
