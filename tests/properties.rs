mod common;

use common::{class, quad};
use gcra_lib::backend::machine::Machine;
use gcra_lib::backend::register_allocation::{
    allocate, group_uses, raw_pressure, select, stack, verify, AllocSettings, Attempt, Broken,
    Pressure, Program, UseKind, UseSpec,
};
use proptest::prelude::*;

const CLASSES: [&str; 3] = ["single", "pair", "low"];

/// Uses as `(class, position)` plus linkages between use indices.
fn program_shape() -> impl Strategy<Value = (Vec<(usize, u32)>, Vec<(usize, usize)>)> {
    prop::collection::vec((0..CLASSES.len(), 0u32..16), 1..12).prop_flat_map(|uses| {
        let count = uses.len();
        (Just(uses), prop::collection::vec((0..count, 0..count), 0..12))
    })
}

/// Uses linked one after the other, so mixed classes force splits inside one chain.
fn chain_shape() -> impl Strategy<Value = (Vec<(usize, u32)>, Vec<(usize, usize)>)> {
    prop::collection::vec((0..CLASSES.len(), 0u32..8), 2..10).prop_map(|uses| {
        let links = (1..uses.len()).map(|index| (index - 1, index)).collect();
        (uses, links)
    })
}

fn build(machine: &Machine, uses: &[(usize, u32)], links: &[(usize, usize)]) -> Program {
    let mut program = Program::new();
    let main = program.add_function("main");
    let mut ids = Vec::new();
    for (index, &(class_index, position)) in uses.iter().enumerate() {
        let kind = if index % 2 == 0 {
            UseKind::TripleOutput
        } else {
            UseKind::Operand
        };
        let spec = UseSpec::new(main, kind, index as u32 / 3)
            .class(class(machine, CLASSES[class_index]))
            .at(0, position);
        ids.push(program.add_use(spec));
    }
    for &(first, second) in links {
        if first != second {
            program.link(ids[first], ids[second]);
        }
    }
    program
}

proptest! {
    #[test]
    fn committed_allocations_are_valid((uses, links) in program_shape()) {
        let machine = quad();
        let mut program = build(&machine, &uses, &links);
        let allocation = allocate(&machine, &mut program, &AllocSettings::default()).unwrap();
        prop_assert!(allocation.attempt_count() as usize <= program.linkages().len() + 1);
        prop_assert!(allocation.locations.iter().all(|l| !l.is_spilled()));
        prop_assert_eq!(verify(&machine, &program, &allocation), Ok(()));
        for linkage in program.linkages() {
            if let Broken::Permanent(attempt) = linkage.broken {
                prop_assert!(attempt < allocation.attempt_count());
            }
        }
    }

    #[test]
    fn allocation_is_deterministic((uses, links) in program_shape()) {
        let machine = quad();
        let mut first = build(&machine, &uses, &links);
        let mut second = first.clone();
        let a = allocate(&machine, &mut first, &AllocSettings::default()).unwrap();
        let b = allocate(&machine, &mut second, &AllocSettings::default()).unwrap();
        prop_assert_eq!(a.locations, b.locations);
        prop_assert_eq!(a.attempts, b.attempts);
        let broken_first: Vec<_> = first.linkages().iter().map(|l| l.broken).collect();
        let broken_second: Vec<_> = second.linkages().iter().map(|l| l.broken).collect();
        prop_assert_eq!(broken_first, broken_second);
    }

    #[test]
    fn grouping_is_idempotent((uses, links) in program_shape()) {
        let machine = quad();
        let program = build(&machine, &uses, &links);
        prop_assert_eq!(group_uses(&program), group_uses(&program));
    }

    #[test]
    fn interference_is_symmetric((uses, links) in program_shape()) {
        let machine = quad();
        let mut program = build(&machine, &uses, &links);
        let attempt = Attempt::prepare(&machine, &mut program, 1).unwrap();
        for group in attempt.groups.iter() {
            prop_assert!(!attempt.graph.interfere(group.id, group.id));
            for &neighbor in attempt.graph.neighbors_of(group.id) {
                prop_assert!(attempt.graph.interfere(group.id, neighbor));
                prop_assert!(attempt.graph.interfere(neighbor, group.id));
                prop_assert!(attempt.graph.neighbors_of(neighbor).contains(&group.id));
            }
        }
    }

    #[test]
    fn relief_is_exact((uses, links) in program_shape()) {
        let machine = quad();
        let mut program = build(&machine, &uses, &links);
        let attempt = Attempt::prepare(&machine, &mut program, 1).unwrap();
        let mut pressure = Pressure::new(&machine, &attempt.groups, &attempt.graph);
        for group in attempt.groups.iter() {
            let neighbors: Vec<_> = attempt
                .graph
                .neighbors_of(group.id)
                .iter()
                .map(|&n| (attempt.groups.get(n).class, attempt.groups.get(n).num_registers))
                .collect();
            for removed in 0..neighbors.len() {
                pressure.relieve(&machine, group, &neighbors[removed..=removed]);
                let expected = raw_pressure(&machine, group.class, &neighbors[removed + 1..]);
                prop_assert_eq!(pressure.raw(group.id), expected.as_slice());
            }
        }
    }

    #[test]
    fn certain_groups_are_always_assigned((uses, links) in program_shape()) {
        let machine = quad();
        let mut program = build(&machine, &uses, &links);
        let mut attempt = Attempt::prepare(&machine, &mut program, 1).unwrap();
        let mut pressure = Pressure::new(&machine, &attempt.groups, &attempt.graph);
        let stacked = stack(&machine, &mut attempt.groups, &attempt.graph, &mut pressure);
        if let Err(failed) = select(&machine, &mut attempt.groups, &attempt.graph, &stacked) {
            for group in failed {
                prop_assert!(!attempt.groups.get(group).assignment_certain);
            }
        }
    }

    #[test]
    fn split_chains_stay_linked((uses, links) in chain_shape()) {
        let machine = quad();
        let mut program = build(&machine, &uses, &links);
        let attempt = Attempt::prepare(&machine, &mut program, 1).unwrap();
        let regrouped = group_uses(&program);
        prop_assert_eq!(regrouped.len(), attempt.groups.len());
        for group in attempt.groups.iter() {
            prop_assert!(regrouped.sets.contains(&group.members));
        }

        let allocation = allocate(&machine, &mut program, &AllocSettings::default()).unwrap();
        prop_assert_eq!(verify(&machine, &program, &allocation), Ok(()));
    }
}
