//! Scripted demonstration of the dwell engine: replays a fingertip
//! trajectory at a fixed tick rate and prints every commit and the
//! resulting text buffer.

use std::time::{Duration, Instant};

use dwell_core::{Composer, DwellThresholds, DwellTracker, Hand};
use key_layout::KeyId;

const TICK: Duration = Duration::from_millis(33);

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              Dwell Engine Walkthrough                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // (hand, key, ticks-held) script: types "Hi", grazes ClearAll too
    // briefly to trigger it, then holds it long enough to wipe.
    let script: &[(Hand, Option<KeyId>, u32)] = &[
        (Hand::Left,  Some(KeyId::Shift),     20),
        (Hand::Left,  None,                    2),
        (Hand::Left,  Some(KeyId::Char('H')), 20),
        (Hand::Left,  None,                    2),
        (Hand::Right, Some(KeyId::Char('I')), 20),
        (Hand::Right, None,                    2),
        (Hand::Right, Some(KeyId::ClearAll),  20),  // graze: under 2 s
        (Hand::Right, None,                    2),
        (Hand::Right, Some(KeyId::ClearAll),  70),  // deliberate hold
    ];

    let thresholds = DwellThresholds::default();
    let mut tracker = DwellTracker::new(thresholds);
    let mut composer = Composer::new();
    let start = Instant::now();

    let mut tick = 0u32;
    for &(hand, key, ticks) in script {
        let label = key.map(|k| k.label()).unwrap_or_else(|| "-".to_string());
        println!("  {:>5} hand over {:<9} for {} ticks", hand.label(), label, ticks);
        for _ in 0..ticks {
            let now = start + TICK * tick;
            tick += 1;
            if let Some(k) = tracker.on_sample(hand, key, now).committed() {
                let action = composer.apply(k);
                println!(
                    "        tick {:>3}: COMMIT {:<9} → {:?}   buffer = {:?}",
                    tick,
                    k.label(),
                    action,
                    composer.text()
                );
            }
        }
    }

    println!();
    println!("  Final buffer: {:?}", composer.text());
    println!();
}
