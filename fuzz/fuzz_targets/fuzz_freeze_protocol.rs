//! Drives arbitrary operation sequences through the freeze protocol and
//! checks the depth/dirty-flag invariants after every step.

#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rebind::{ListChange, ObservableVec};

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Op {
    Push(u8),
    Insert(u8, u8),
    Remove(u8),
    Pop,
    Set(u8, u8),
    MoveItem(u8, u8),
    Clear,
    Freeze,
    Unfreeze,
}

#[derive(Arbitrary, Debug)]
struct Plan {
    auto_flush: bool,
    ops: Vec<Op>,
}

fuzz_target!(|plan: Plan| {
    let list: ObservableVec<u8> = ObservableVec::with_auto_flush(plan.auto_flush);
    let events = Rc::new(Cell::new(0_usize));
    let sink = Rc::clone(&events);
    let _sub = list.subscribe(move |change: &ListChange| {
        let _ = change;
        sink.set(sink.get() + 1);
    });

    let mut expected_depth = 0_usize;

    for op in plan.ops {
        let events_before = events.get();
        match op {
            Op::Push(v) => list.push(v),
            Op::Insert(i, v) => {
                let index = (i as usize) % (list.len() + 1);
                list.insert(index, v);
            }
            Op::Remove(i) => {
                if !list.is_empty() {
                    let index = (i as usize) % list.len();
                    list.remove(index);
                }
            }
            Op::Pop => {
                list.pop();
            }
            Op::Set(i, v) => {
                if !list.is_empty() {
                    let index = (i as usize) % list.len();
                    list.set(index, v);
                }
            }
            Op::MoveItem(from, to) => {
                if !list.is_empty() {
                    let from = (from as usize) % list.len();
                    let to = (to as usize) % list.len();
                    list.move_item(from, to);
                }
            }
            Op::Clear => list.clear(),
            Op::Freeze => {
                list.freeze();
                expected_depth += 1;
                assert!(!list.changed_while_frozen(), "freeze must reset the flag");
            }
            Op::Unfreeze => {
                let result = list.unfreeze();
                if expected_depth == 0 {
                    assert!(result.is_err(), "imbalance must be rejected");
                } else {
                    assert!(result.is_ok());
                    expected_depth -= 1;
                }
            }
        }

        assert_eq!(list.freeze_depth(), expected_depth);
        if list.is_frozen() {
            assert_eq!(
                events.get(),
                events_before,
                "event leaked through a frozen list"
            );
        }
    }
});
