#![no_main]

use libfuzzer_sys::fuzz_target;

use lapse_types::{Tick, WindowParams};
use lapse_window::WindowClock;

// Fuzz the clock arithmetic with arbitrary parameters and ticks.
// Coordinates must be well formed and the fast path must agree with the
// general path.
fuzz_target!(|data: &[u8]| {
    if data.len() < 24 {
        return;
    }

    let tick_duration_ms = u64::from_le_bytes([
        data[0], data[1], data[2], data[3],
        data[4], data[5], data[6], data[7],
    ]);
    let slots_per_era = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    let frame_size = u32::from_le_bytes([data[12], data[13], data[14], data[15]]);
    let tick = Tick::new(u64::from_le_bytes([
        data[16], data[17], data[18], data[19],
        data[20], data[21], data[22], data[23],
    ]));

    let Ok(clock) = WindowClock::new(WindowParams::new(tick_duration_ms, slots_per_era, frame_size)) else {
        return;
    };
    let general = clock.clone().without_fast_path();

    let coordinate = clock.coordinate_of(tick);
    assert_eq!(coordinate, general.coordinate_of(tick));
    assert!(coordinate.slot < clock.slots_per_era());

    let frame = clock.frame(tick);
    let safe = clock.safe_frame(tick);
    assert!(frame.contains(coordinate));
    assert!(frame.is_within(&safe));

    // These must never panic
    let _ = clock.index_of(coordinate);
    let _ = clock.expires_at(coordinate);
    let _ = clock.slot_start(frame.from);
});
