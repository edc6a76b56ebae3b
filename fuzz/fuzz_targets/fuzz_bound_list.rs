#![no_main]

//! Random operation sequences against a strongly bound list pair plus a weak
//! dependent. The pair must stay equal after every operation; a failed
//! operation must not change the side it was issued on.

use arbitrary::Arbitrary;
use bindery::BindableList;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Push(u8),
    Insert(u8, u8),
    Set(u8, u8),
    Remove(u8),
    RemoveItem(u8),
    RemoveAll(Vec<u8>),
    Retain(u8),
    Clear,
    Sort,
    Reverse,
    Pop,
    PopFront,
    Disable(bool),
    WriteDependent(u8),
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed: Vec<u8>,
    ops: Vec<(bool, Op)>,
}

fuzz_target!(|input: Input| {
    let a = BindableList::from(input.seed);
    let b = a.bound_copy();
    let dependent = a.weak_copy();

    for (on_a, op) in input.ops.iter().take(256) {
        let target = if *on_a { &a } else { &b };
        let before = target.to_vec();
        let result = match op {
            Op::Push(v) => target.push(*v),
            Op::Insert(i, v) => target.insert(usize::from(*i), *v),
            Op::Set(i, v) => target.set(usize::from(*i), *v).map(drop),
            Op::Remove(i) => target.remove(usize::from(*i)).map(drop),
            Op::RemoveItem(v) => target.remove_item(v).map(drop),
            Op::RemoveAll(vs) => target.remove_all(vs).map(drop),
            Op::Retain(min) => target.retain(|v| v >= min).map(drop),
            Op::Clear => target.clear(),
            Op::Sort => target.sort(),
            Op::Reverse => target.reverse(),
            Op::Pop => target.pop().map(drop),
            Op::PopFront => target.pop_front().map(drop),
            Op::Disable(flag) => {
                target.set_disabled(*flag);
                Ok(())
            }
            Op::WriteDependent(v) => {
                let _ = dependent.push(*v);
                Ok(())
            }
        };
        if result.is_err() {
            assert_eq!(target.to_vec(), before);
        }
        assert_eq!(a.to_vec(), b.to_vec());
        assert_eq!(a.is_disabled(), b.is_disabled());
    }
});
