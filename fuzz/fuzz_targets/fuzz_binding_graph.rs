#![no_main]

//! Random graph surgery (bind, weak bind, unbind, drop) interleaved with
//! writes. Every write must terminate and leave strongly bound values equal.

use arbitrary::Arbitrary;
use bindery::{Bindable, EdgeKind};
use libfuzzer_sys::fuzz_target;

const SLOTS: usize = 8;

#[derive(Debug, Arbitrary)]
enum Op {
    Bind(u8, u8),
    WeakBind(u8, u8),
    Unbind(u8),
    UnbindFrom(u8, u8),
    Replace(u8),
    Set(u8, i16),
}

fn slot(i: u8) -> usize {
    usize::from(i) % SLOTS
}

fuzz_target!(|ops: Vec<Op>| {
    let mut slots: Vec<Bindable<i16>> = (0..SLOTS).map(|_| Bindable::new(0)).collect();

    for op in ops.iter().take(256) {
        match *op {
            Op::Bind(x, y) => {
                let _ = slots[slot(x)].bind_to(&slots[slot(y)]);
            }
            Op::WeakBind(x, y) => {
                let _ = slots[slot(x)].weak_bind(&slots[slot(y)]);
            }
            Op::UnbindFrom(x, y) => {
                let _ = slots[slot(x)].unbind_from(&slots[slot(y)]);
            }
            Op::Unbind(x) => slots[slot(x)].unbind(),
            Op::Replace(x) => slots[slot(x)] = Bindable::new(0),
            Op::Set(x, v) => {
                let node = &slots[slot(x)];
                node.set(v).unwrap();
                for other in &slots {
                    if other.edge_to(node) == Some(EdgeKind::Strong) {
                        assert_eq!(other.get(), v);
                    }
                }
            }
        }
    }
});
