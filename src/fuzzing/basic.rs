use std::collections::BTreeSet;

use itertools::Itertools;

use super::*;

/// Reference model: linear scan over the prefix list, later entries of
/// equal length winning.
fn lpm_reference(data: &[(TestPrefix, i32)], addr: u32) -> i32 {
    let mut best = -1;
    let mut best_len = 0;
    for (p, v) in data {
        if p.covers(addr) && p.1 >= best_len {
            best = *v;
            best_len = p.1;
        }
    }
    best
}

/// Sort generated prefixes by mask, as the insertion order requires, and
/// keep the payloads clear of the `-1` sentinel.
fn sorted_input(list: Vec<(TestPrefix, u16)>) -> Vec<(TestPrefix, i32)> {
    list.into_iter()
        .map(|(p, v)| (p, i32::from(v)))
        .sorted_by_key(|(p, _)| p.1)
        .collect()
}

/// Probe addresses: the caller's own picks plus the edges of every prefix.
fn probes(data: &[(TestPrefix, i32)], extra: &[u32]) -> Vec<u32> {
    let mut probes = extra.to_vec();
    for (p, _) in data {
        probes.push(p.0);
        probes.push(p.0 | !TestPrefix::bitmask(p.1));
        probes.push(p.0.wrapping_sub(1));
        probes.push(p.0.wrapping_add(1));
    }
    probes
}

prop!(tritrie_matches_linear_scan, _tritrie_matches_linear_scan);
fn _tritrie_matches_linear_scan(input: (Vec<(TestPrefix, u16)>, Vec<u32>)) -> bool {
    let (list, extra) = input;
    let data = sorted_input(list);
    let mut trie = Tritrie::<u32, i32, 16>::new();
    for (p, v) in &data {
        trie.add_prefix(p.0, p.1, *v).unwrap();
    }

    probes(&data, &extra)
        .into_iter()
        .all(|ip| trie.query(ip) == lpm_reference(&data, ip))
}

prop!(flat_matches_tritrie, _flat_matches_tritrie);
fn _flat_matches_tritrie(input: (Vec<(TestPrefix, u16)>, Vec<u32>)) -> bool {
    let (list, extra) = input;
    let data = sorted_input(list);
    let mut trie = Tritrie::<u32, i32, 64>::new();
    for (p, v) in &data {
        trie.add_prefix(p.0, p.1, *v).unwrap();
    }
    let mut flat = Flatritrie::<u32, i32, 64>::new();
    flat.build(&trie);
    // a rebuild must not change any answer
    flat.build(&trie);

    probes(&data, &extra)
        .into_iter()
        .all(|ip| flat.query(ip) == trie.query(ip) && flat.query(ip) == lpm_reference(&data, ip))
}

prop!(multi_matches_covering_sets, _multi_matches_covering_sets);
fn _multi_matches_covering_sets(input: (Vec<(TestPrefix, u16)>, Vec<u32>)) -> bool {
    let (list, extra) = input;
    let data = sorted_input(list);
    let mut multi = MultiTritrie::<u32, i32, 16>::new();
    for (p, v) in &data {
        multi.add_prefix(p.0, p.1, *v).unwrap();
    }

    probes(&data, &extra).into_iter().all(|ip| {
        let expected: BTreeSet<i32> = data
            .iter()
            .filter(|(p, _)| p.covers(ip))
            .map(|(_, v)| *v)
            .collect();
        let all = multi.query_all(ip);
        let lpm = multi.query(ip);
        all == &expected
            && lpm == lpm_reference(&data, ip)
            && (lpm == -1 || all.contains(&lpm))
    })
}

prop!(ipv6_matches_linear_scan, _ipv6_matches_linear_scan);
fn _ipv6_matches_linear_scan(input: (Vec<(TestPrefix6, u16)>, Vec<u128>)) -> bool {
    let (list, extra) = input;
    let data: Vec<(TestPrefix6, i32)> = list
        .into_iter()
        .map(|(p, v)| (p, i32::from(v)))
        .sorted_by_key(|(p, _)| p.1)
        .collect();
    let mut trie = Tritrie::<u128, i32, 64>::new();
    for (p, v) in &data {
        trie.add_prefix(p.0, p.1, *v).unwrap();
    }
    let mut flat = Flatritrie::<u128, i32, 64>::new();
    flat.build(&trie);

    let reference = |addr: u128| {
        let mut best = -1;
        let mut best_len = 0;
        for (p, v) in &data {
            if p.covers(addr) && p.1 >= best_len {
                best = *v;
                best_len = p.1;
            }
        }
        best
    };

    let mut probes = extra;
    for (p, _) in &data {
        probes.push(p.0);
        probes.push(p.0 | !TestPrefix6::bitmask(p.1));
    }
    probes
        .into_iter()
        .all(|ip| trie.query(ip) == reference(ip) && flat.query(ip) == reference(ip))
}
