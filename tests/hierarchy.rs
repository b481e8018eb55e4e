// Full-skeleton scenarios: hierarchical scaling over chains and twin
// subtrees, driven through the in-memory pose provider.

use nalgebra_glm as glm;

use bonesculpt_rs::{
    ApplyMode, BoneEdit, BoneGraph, BoneKey, BoneTopology, FreezeSignals, MemoryPoseProvider,
    PoseFrame, PoseProvider, PoseTemplate, PoseTransform,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn mirror_rule(name: &str) -> Option<String> {
    name.strip_prefix("L ")
        .map(|rest| format!("R {rest}"))
        .or_else(|| name.strip_prefix("R ").map(|rest| format!("L {rest}")))
}

fn seed(provider: &mut MemoryPoseProvider, key: BoneKey, model: glm::Vec3, local: glm::Vec3) {
    provider.seed(key, PoseFrame::Model, PoseTransform::at(model));
    provider.seed(key, PoseFrame::Local, PoseTransform::at(local));
}

fn model_of(provider: &MemoryPoseProvider, key: BoneKey) -> PoseTransform {
    provider.read_transform(key, PoseFrame::Model).unwrap()
}

fn local_of(provider: &MemoryPoseProvider, key: BoneKey) -> PoseTransform {
    provider.read_transform(key, PoseFrame::Local).unwrap()
}

/// Root, child and grandchild in a straight line along x.
fn chain() -> (BoneGraph, MemoryPoseProvider) {
    let root = BoneKey::new(0, 0);
    let child = BoneKey::new(0, 1);
    let grandchild = BoneKey::new(1, 2);

    let mut topology = BoneTopology::new();
    topology.push(root, "Root", None);
    topology.push(child, "Child", Some(root));
    topology.push(grandchild, "Grandchild", Some(child));
    let graph = BoneGraph::build(&topology, |_| None).unwrap();

    let mut provider = MemoryPoseProvider::new();
    seed(&mut provider, root, glm::vec3(0.0, 0.0, 0.0), glm::vec3(0.0, 0.0, 0.0));
    seed(&mut provider, child, glm::vec3(1.0, 0.0, 0.0), glm::vec3(1.0, 0.0, 0.0));
    seed(
        &mut provider,
        grandchild,
        glm::vec3(2.0, 0.0, 0.0),
        glm::vec3(1.0, 0.0, 0.0),
    );
    (graph, provider)
}

fn link_hierarchical(graph: &mut BoneGraph, bone_name: &str, scaling: glm::Vec3) {
    let mut template = PoseTemplate::new("test");
    let mut edit = BoneEdit::default();
    edit.set_hierarchical_scaling(scaling);
    template.insert(bone_name, edit);
    assert_eq!(graph.link_template(&template), 1);
}

#[test]
fn chain_scale_moves_descendants_and_rewrites_locals() {
    init_logging();
    let (mut graph, mut provider) = chain();
    link_hierarchical(&mut graph, "Root", glm::vec3(2.0, 1.0, 1.0));

    graph.apply_hierarchical(&mut provider);

    let root = BoneKey::new(0, 0);
    let child = BoneKey::new(0, 1);
    let grandchild = BoneKey::new(1, 2);

    // Root keeps its position, only its scale doubles along x.
    let root_pose = model_of(&provider, root);
    assert_eq!(root_pose.translation, glm::vec3(0.0, 0.0, 0.0));
    assert_eq!(root_pose.scale, glm::vec3(2.0, 1.0, 1.0));

    // Offsets double: child 1 -> 2, grandchild 2 -> 4.
    assert_eq!(model_of(&provider, child).translation, glm::vec3(2.0, 0.0, 0.0));
    assert_eq!(
        model_of(&provider, grandchild).translation,
        glm::vec3(4.0, 0.0, 0.0)
    );
    assert_eq!(model_of(&provider, child).scale, glm::vec3(2.0, 1.0, 1.0));

    // Local poses are rewritten from the updated model positions.
    assert_eq!(local_of(&provider, child).translation, glm::vec3(2.0, 0.0, 0.0));
    assert_eq!(
        local_of(&provider, grandchild).translation,
        glm::vec3(2.0, 0.0, 0.0)
    );

    // 3 model writes plus 2 local writes; root has no parent to offset from.
    assert_eq!(provider.write_count(), 5);

    // Every touched part is flagged for downstream recomputation.
    assert!(provider.is_out_of_sync(0));
    assert!(provider.is_out_of_sync(1));
}

#[test]
fn identity_hierarchical_scale_writes_nothing() {
    init_logging();
    let (mut graph, mut provider) = chain();
    link_hierarchical(&mut graph, "Root", glm::vec3(1.0, 1.0, 1.0));

    graph.apply_hierarchical(&mut provider);

    assert_eq!(provider.write_count(), 0);
    assert!(!provider.is_out_of_sync(0));
    assert_eq!(
        model_of(&provider, BoneKey::new(0, 1)).translation,
        glm::vec3(1.0, 0.0, 0.0)
    );
}

#[test]
fn invalid_pose_is_skipped_without_aborting_the_walk() {
    init_logging();
    let (mut graph, mut provider) = chain();
    link_hierarchical(&mut graph, "Root", glm::vec3(2.0, 1.0, 1.0));

    // The child's model pose is mid-frame garbage; the walk must still
    // reach the grandchild.
    let child = BoneKey::new(0, 1);
    let mut broken = PoseTransform::at(glm::vec3(1.0, 0.0, 0.0));
    broken.translation.x = f32::NAN;
    provider.seed(child, PoseFrame::Model, broken);

    graph.apply_hierarchical(&mut provider);

    // Child untouched; grandchild has no updated parent position so it
    // keeps its own, with the scale still applied.
    let grandchild = model_of(&provider, BoneKey::new(1, 2));
    assert_eq!(grandchild.translation, glm::vec3(2.0, 0.0, 0.0));
    assert_eq!(grandchild.scale, glm::vec3(2.0, 1.0, 1.0));
}

/// Spine with a left and right hand/finger pair, twins detected by the
/// L/R naming rule.
fn biped() -> (BoneGraph, MemoryPoseProvider) {
    let spine = BoneKey::new(0, 0);
    let l_hand = BoneKey::new(0, 1);
    let l_finger = BoneKey::new(0, 2);
    let r_hand = BoneKey::new(0, 3);
    let r_finger = BoneKey::new(0, 4);

    let mut topology = BoneTopology::new();
    topology.push(spine, "Spine", None);
    topology.push(l_hand, "L Hand", Some(spine));
    topology.push(l_finger, "L Finger", Some(l_hand));
    topology.push(r_hand, "R Hand", Some(spine));
    topology.push(r_finger, "R Finger", Some(r_hand));
    let graph = BoneGraph::build(&topology, mirror_rule).unwrap();

    let mut provider = MemoryPoseProvider::new();
    seed(&mut provider, spine, glm::vec3(0.0, 0.0, 0.0), glm::vec3(0.0, 0.0, 0.0));
    seed(&mut provider, l_hand, glm::vec3(1.0, 0.0, 0.0), glm::vec3(1.0, 0.0, 0.0));
    seed(
        &mut provider,
        l_finger,
        glm::vec3(1.5, 0.0, 0.0),
        glm::vec3(0.5, 0.0, 0.0),
    );
    seed(&mut provider, r_hand, glm::vec3(-1.0, 0.0, 0.0), glm::vec3(-1.0, 0.0, 0.0));
    seed(
        &mut provider,
        r_finger,
        glm::vec3(-1.5, 0.0, 0.0),
        glm::vec3(-0.5, 0.0, 0.0),
    );
    (graph, provider)
}

#[test]
fn twin_subtree_receives_the_same_unmirrored_scale() {
    init_logging();
    let (mut graph, mut provider) = biped();
    link_hierarchical(&mut graph, "L Hand", glm::vec3(2.0, 2.0, 2.0));

    graph.apply_hierarchical(&mut provider);

    let l_hand = model_of(&provider, BoneKey::new(0, 1));
    let l_finger = model_of(&provider, BoneKey::new(0, 2));
    let r_hand = model_of(&provider, BoneKey::new(0, 3));
    let r_finger = model_of(&provider, BoneKey::new(0, 4));

    // Scale roots on both sides keep their positions.
    assert_eq!(l_hand.translation, glm::vec3(1.0, 0.0, 0.0));
    assert_eq!(r_hand.translation, glm::vec3(-1.0, 0.0, 0.0));
    assert_eq!(l_hand.scale, glm::vec3(2.0, 2.0, 2.0));
    assert_eq!(r_hand.scale, glm::vec3(2.0, 2.0, 2.0));

    // The identical S is replicated, not reflected: both fingers move
    // outward by their own side's rescaled offset.
    assert_eq!(l_finger.translation, glm::vec3(2.0, 0.0, 0.0));
    assert_eq!(r_finger.translation, glm::vec3(-2.0, 0.0, 0.0));

    // Locals follow the updated model positions.
    assert_eq!(
        local_of(&provider, BoneKey::new(0, 2)).translation,
        glm::vec3(1.0, 0.0, 0.0)
    );
    assert_eq!(
        local_of(&provider, BoneKey::new(0, 4)).translation,
        glm::vec3(-1.0, 0.0, 0.0)
    );

    // 4 model writes + 2 finger local writes: every node exactly once,
    // even though the right side is reachable through two twin links.
    assert_eq!(provider.write_count(), 6);

    // The untouched spine keeps its pose.
    assert_eq!(
        model_of(&provider, BoneKey::new(0, 0)).translation,
        glm::vec3(0.0, 0.0, 0.0)
    );
}

#[test]
fn out_of_sync_part_rejects_plain_writes_until_resynced() {
    init_logging();
    let (mut graph, mut provider) = chain();
    link_hierarchical(&mut graph, "Root", glm::vec3(2.0, 1.0, 1.0));
    graph.apply_hierarchical(&mut provider);
    assert!(provider.is_out_of_sync(0));

    // A follow-up translation edit on the same part goes nowhere.
    let mut template = PoseTemplate::new("follow-up");
    let mut edit = BoneEdit::default();
    edit.set_translation(glm::vec3(0.0, 5.0, 0.0));
    template.insert("Child", edit);
    graph.link_template(&template);

    let writes_before = provider.write_count();
    graph.apply(&mut provider, &FreezeSignals::default(), ApplyMode::Full);
    assert_eq!(provider.write_count(), writes_before);

    provider.resync(0);
    provider.resync(1);
    graph.apply(&mut provider, &FreezeSignals::default(), ApplyMode::Full);
    assert!(provider.write_count() > writes_before);
}

#[test]
fn linking_an_absent_bone_name_leaves_the_node_inactive() {
    init_logging();
    let (mut graph, _) = chain();
    let mut template = PoseTemplate::new("elsewhere");
    template.insert("Tail", BoneEdit::default());

    assert_eq!(graph.link_template(&template), 0);
    let root = graph.bone_by_name_mut("Root").unwrap();
    assert!(!root.link(Some(&template)));
    assert!(!root.is_active());
}

#[test]
fn update_runs_plain_pass_before_hierarchical_pass() {
    init_logging();
    let (mut graph, mut provider) = chain();

    let mut template = PoseTemplate::new("combo");
    let mut edit = BoneEdit::default();
    edit.set_translation(glm::vec3(0.0, 1.0, 0.0));
    edit.set_hierarchical_scaling(glm::vec3(2.0, 1.0, 1.0));
    template.insert("Root", edit);
    graph.link_template(&template);

    graph.update(&mut provider, &FreezeSignals::default(), ApplyMode::Full);

    // Plain pass lifted the root, hierarchical pass rescaled the chain
    // around the lifted position: the child's offset to the root was
    // (1,-1,0), so it lands at (0,1,0) + (2,-1,0).
    let root = model_of(&provider, BoneKey::new(0, 0));
    assert_eq!(root.translation, glm::vec3(0.0, 1.0, 0.0));
    assert_eq!(root.scale, glm::vec3(2.0, 1.0, 1.0));
    let child = model_of(&provider, BoneKey::new(0, 1));
    assert_eq!(child.translation, glm::vec3(2.0, 0.0, 0.0));
}
