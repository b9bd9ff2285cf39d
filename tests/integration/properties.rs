//! Property tests: the parallel count always equals the sequential count

use super::naive_count;
use proptest::prelude::*;
use ruwc::{count_sequential, CountConfig, DelimiterCounter, Strategy};
use std::io::Cursor;
use std::time::Duration;

fn strategy_of(polling: bool) -> Strategy {
    if polling {
        Strategy::Polling
    } else {
        Strategy::Channel
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn parallel_count_equals_sequential(
        data in prop::collection::vec(prop_oneof![3 => Just(b'\n'), 7 => any::<u8>()], 0..4096),
        workers in 1usize..6,
        capacity in 1usize..300,
        polling in any::<bool>(),
    ) {
        let config = CountConfig::new()
            .with_workers(workers)
            .with_buffer_capacity(capacity)
            .with_strategy(strategy_of(polling))
            .with_poll_interval(Duration::from_micros(100));
        let report = DelimiterCounter::new(config)
            .unwrap()
            .count_reader(Cursor::new(data.clone()))
            .unwrap();

        let sequential = count_sequential(Cursor::new(data.clone())).unwrap();
        prop_assert!(report.is_complete());
        prop_assert_eq!(report.total, sequential);
        prop_assert_eq!(report.total, naive_count(&data));
        prop_assert_eq!(report.stats.bytes_read, data.len() as u64);
        prop_assert_eq!(report.stats.units_filled, report.stats.units_scanned);
    }

    #[test]
    fn result_does_not_depend_on_capacity(
        data in prop::collection::vec(any::<u8>(), 0..2048),
        small in 1usize..64,
        large in 64usize..4096,
    ) {
        let count_with = |capacity: usize| {
            DelimiterCounter::new(CountConfig::new().with_workers(2).with_buffer_capacity(capacity))
                .unwrap()
                .count_reader(Cursor::new(data.clone()))
                .unwrap()
                .total
        };
        prop_assert_eq!(count_with(small), count_with(large));
    }
}
