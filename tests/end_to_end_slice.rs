//! Full-pipeline integration test (spec §8.2 scenario 7): a straight-line
//! function that writes two independent variables and then reads one of
//! them. Slicing on the read must keep the matching write and drop the
//! unrelated one, driven through every stage of the real pipeline —
//! `PointerGraph` + `solve_fs`, `ReadWriteGraph` site construction,
//! `ReachingDefinitionsAnalysis`, `ControlDependence::compute`,
//! `SystemDependenceGraph::assemble`, and `Slicer::mark`/`slice` — rather
//! than through any single feature's unit-level builder calls.

use sdg_slicer::{
    assemble, solve_fs, BlockGraph, CDFunction, CallSite, FunctionInput, PointerGraph,
    ReachingDefinitionsAnalysis, ReadWriteGraph, Slicer, SystemDependenceGraph,
};
use sdg_slicer::features::control_dependence::compute;
use sdg_slicer::features::pointer_graph::PSNodeKind;
use sdg_slicer::features::read_write_graph::{RWBBlockId, RWNodeId, RWNodeKind};
use sdg_slicer::features::sdg::DGNodeId;
use sdg_slicer::shared::{LocationId, Offset};

fn dg_node_for(
    sdg: &SystemDependenceGraph,
    rwg: &ReadWriteGraph,
    function: &str,
    block: RWBBlockId,
    rw_node: RWNodeId,
) -> DGNodeId {
    let owner = sdg.graph_by_function(function).unwrap();
    let dg_block = sdg.graph(owner).unwrap().entry_block.unwrap();
    let idx = rwg
        .block(block)
        .unwrap()
        .nodes
        .iter()
        .position(|n| *n == rw_node)
        .unwrap();
    sdg.block(dg_block).unwrap().nodes[idx]
}

#[test]
fn slice_on_a_load_keeps_the_matching_store_and_drops_the_unrelated_one() {
    // --- pointer graph: two independent variables, `x` and `y` ---
    let mut psg = PointerGraph::new();
    let addr_x = psg.create(PSNodeKind::Alloc);
    let addr_y = psg.create(PSNodeKind::Alloc);
    psg.add_cfg_edge(addr_x, addr_y).unwrap();
    psg.create_subgraph(addr_x, None).unwrap();
    psg.set_entry(addr_x).unwrap();

    let pta = solve_fs(&mut psg, false, 1000);

    // --- read-write graph: store x, store y, load x ---
    let mut rwg = ReadWriteGraph::new(LocationId(u32::MAX));
    let block = rwg.create_block();

    let store_x = rwg.create_node(RWNodeKind::Store);
    let store_y = rwg.create_node(RWNodeKind::Store);
    let load_x = rwg.create_node(RWNodeKind::Load);

    rwg.push_to_block(block, store_x).unwrap();
    rwg.push_to_block(block, store_y).unwrap();
    rwg.push_to_block(block, load_x).unwrap();

    rwg.add_cfg_edge(store_x, store_y).unwrap();
    rwg.add_cfg_edge(store_y, load_x).unwrap();

    rwg.create_subgraph(block);

    let width = Offset::new(8);
    rwg.build_store_sites(store_x, addr_x, width, &pta).unwrap();
    rwg.build_store_sites(store_y, addr_y, width, &pta).unwrap();
    rwg.build_load_sites(load_x, addr_x, width, &pta).unwrap();

    // --- reaching definitions ---
    let mut rda = ReachingDefinitionsAnalysis::new();
    rda.run(&rwg, &[store_x, store_y, load_x]);

    // --- control dependence: one block, no branches, so nothing depends
    // on anything (spec §8.2 scenario 6's baseline) ---
    let cd_graph: BlockGraph<RWBBlockId> = BlockGraph::new();
    let cd_function = CDFunction::new(block);
    let cd = compute(&cd_graph, &[cd_function], false);

    // --- assemble the SDG ---
    let mut sdg = SystemDependenceGraph::new(64);
    let functions = vec![FunctionInput {
        name: "f".to_string(),
        entry_block: block,
        is_variadic: false,
        formal_parameter_count: 0,
    }];
    let call_sites: Vec<CallSite> = Vec::new();
    assemble(&mut sdg, &rwg, &rda, &cd, &functions, &call_sites).unwrap();

    let dg_store_x = dg_node_for(&sdg, &rwg, "f", block, store_x);
    let dg_store_y = dg_node_for(&sdg, &rwg, "f", block, store_y);
    let dg_load_x = dg_node_for(&sdg, &rwg, "f", block, load_x);

    // Sanity check before slicing: the load's memory dependence should
    // already point at the matching store, not the unrelated one.
    assert!(sdg.node(dg_load_x).unwrap().mem_deps.contains(&dg_store_x));
    assert!(!sdg.node(dg_load_x).unwrap().mem_deps.contains(&dg_store_y));

    // --- slice on the load ---
    let owner = sdg.graph_by_function("f").unwrap();
    let mut slicer = Slicer::new();
    let slice_id = slicer.mark(&mut sdg, dg_load_x, None).unwrap();
    slicer.slice(&mut sdg, owner, slice_id).unwrap();

    assert!(sdg.node(dg_load_x).is_some());
    assert!(sdg.node(dg_store_x).is_some());
    assert!(sdg.node(dg_store_y).is_none());
}
