extern crate limpet_rt;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use limpet_rt::heap;
use limpet_rt::roots;
use limpet_rt::{str_from, Dict, Gc, List, Str};

fn managed_to_string(s: Gc<Str>) -> String {
    String::from_utf8(s.as_bytes().to_vec()).unwrap()
}

/// Random churn against a list of strings, checked against a Rust-side
/// mirror. A small heap keeps the collector busy throughout.
#[test]
fn test_list_churn_matches_mirror() {
    heap::init(8192);
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut l = Gc::<List<Gc<Str>>>::null();
    roots!(l);
    l = List::new();
    let mut mirror: Vec<String> = Vec::new();

    for step in 0..3000 {
        match rng.gen_range(0..10) {
            0..=5 => {
                let text = format!("s{}", rng.gen_range(0..1000));
                l.append(str_from(&text));
                mirror.push(text);
            }
            6..=7 => {
                if !mirror.is_empty() {
                    let i = rng.gen_range(0..mirror.len());
                    let popped = l.pop_at(i as i32).unwrap();
                    let expected = mirror.remove(i);
                    assert_eq!(managed_to_string(popped), expected);
                }
            }
            8 => {
                if !mirror.is_empty() {
                    let i = rng.gen_range(0..mirror.len());
                    let text = format!("set{}", step);
                    l.set(i as i32, str_from(&text)).unwrap();
                    mirror[i] = text;
                }
            }
            _ => {
                heap::collect();
            }
        }

        assert_eq!(l.len() as usize, mirror.len());
        if step % 500 == 0 {
            for (i, expected) in mirror.iter().enumerate() {
                let got = l.index(i as i32).unwrap();
                assert_eq!(&managed_to_string(got), expected);
            }
        }
    }

    heap::collect();
    for (i, expected) in mirror.iter().enumerate() {
        let got = l.index(i as i32).unwrap();
        assert_eq!(&managed_to_string(got), expected);
    }
}

/// Random churn against a dict with managed keys, checked against a
/// HashMap mirror.
#[test]
fn test_dict_churn_matches_mirror() {
    heap::init(8192);
    let mut rng = StdRng::seed_from_u64(0xd1c7);

    let mut d = Gc::<Dict<Gc<Str>, i64>>::null();
    roots!(d);
    d = Dict::new();
    let mut mirror: HashMap<String, i64> = HashMap::new();

    for step in 0..3000 {
        let key_text = format!("k{}", rng.gen_range(0..200));
        match rng.gen_range(0..10) {
            0..=5 => {
                d.set(str_from(&key_text), step);
                mirror.insert(key_text, step);
            }
            6..=7 => {
                d.remove(str_from(&key_text));
                mirror.remove(&key_text);
            }
            8 => {
                let got = d.get_default(str_from(&key_text), i64::MIN);
                match mirror.get(&key_text) {
                    Some(&v) => assert_eq!(got, v),
                    None => assert_eq!(got, i64::MIN),
                }
            }
            _ => {
                heap::collect();
            }
        }

        assert_eq!(d.len() as usize, mirror.len());
    }

    heap::collect();
    assert_eq!(d.len() as usize, mirror.len());
    for (key, &value) in &mirror {
        assert_eq!(d.index(str_from(key)).unwrap(), value);
    }
    let mut keys = d.keys();
    roots!(keys);
    for i in 0..keys.len() {
        let k = keys.index(i).unwrap();
        assert!(mirror.contains_key(&managed_to_string(k)));
    }
}

/// Deep structure sharing: many lists referencing the same strings, with
/// collections in between. Content must be stable and shared references
/// must stay consistent.
#[test]
fn test_shared_structure_survives_churn() {
    heap::init(8192);

    let mut shared = str_from("the shared payload");
    roots!(shared);

    let mut lists = Gc::<List<Gc<List<Gc<Str>>>>>::null();
    roots!(lists);
    lists = List::new();

    for _ in 0..50 {
        let mut inner = Gc::<List<Gc<Str>>>::null();
        roots!(inner);
        inner = List::new();
        inner.append(shared);
        inner.append(shared);
        lists.append(inner);
    }

    heap::collect();
    heap::collect();

    for i in 0..50 {
        let inner = lists.index(i).unwrap();
        assert_eq!(inner.len(), 2);
        // both slots point at the one relocated object
        assert_eq!(inner.index(0).unwrap(), inner.index(1).unwrap());
        assert_eq!(inner.index(0).unwrap(), shared);
    }
}
