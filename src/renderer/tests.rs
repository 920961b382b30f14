use std::path::PathBuf;

use glam::{Mat4, Vec3};
use winit::keyboard::KeyCode;

use super::*;
use crate::error::RecordError;
use crate::gpu::fake::{FakeGpu, GpuCall};
use crate::model::Vertex;

fn triangle_mesh() -> Mesh {
    let corner = |x: f32, y: f32| Vertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, -1.0],
        color: [1.0; 4],
        tex_coords: [x, y],
    };
    let mut mesh = Mesh::new("triangle");
    mesh.push_triangle([corner(0.0, 0.0), corner(0.0, 1.0), corner(1.0, 0.0)]);
    mesh
}

fn material() -> MaterialRef {
    MaterialRef {
        name: "test".to_string(),
        diffuse_texture: PathBuf::from("test.png"),
    }
}

fn renderer_with(gpu: FakeGpu, config: &ViewerConfig) -> Renderer<FakeGpu> {
    Renderer::new(gpu, triangle_mesh(), material(), config).unwrap()
}

fn render_target(commands: &[Command]) -> usize {
    commands
        .iter()
        .find_map(|c| match c {
            Command::SetRenderTargets { back_buffer, .. } => Some(*back_buffer),
            _ => None,
        })
        .expect("list binds a render target")
}

fn signals(calls: &[GpuCall]) -> Vec<u64> {
    calls
        .iter()
        .filter_map(|c| match c {
            GpuCall::Signal(v) => Some(*v),
            _ => None,
        })
        .collect()
}

#[test]
fn test_scene_constants_layout() {
    assert_eq!(std::mem::size_of::<SceneConstants>(), 256);
    assert_eq!(SceneConstants::default().as_bytes().len(), 256);
}

#[test]
fn test_constants_stored_transposed() {
    let world = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let constants = compute_constants(world, Mat4::IDENTITY, 1.0);

    // Each stored row is a row of the mathematical matrix
    assert_eq!(constants.world_view[0], [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(constants.world_view[1], [0.0, 1.0, 0.0, 2.0]);
    assert_eq!(constants.world_view[2], [0.0, 0.0, 1.0, 3.0]);
    assert_eq!(constants.world_view[3], [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(constants.world_view_matrix(), world);
}

#[test]
fn test_world_view_is_view_for_identity_world() {
    let mut camera = Camera::new(0.01, 0.1);
    camera.rotate(40.0, -20.0);
    camera.move_local(Vec3::new(1.0, 0.0, 2.0));
    let view = camera.view_matrix();

    let constants = compute_constants(Mat4::IDENTITY, view, 4.0 / 3.0);
    assert!(constants.world_view_matrix().abs_diff_eq(view, 1e-6));

    let expected = constants::projection_matrix(4.0 / 3.0) * view;
    assert!(constants.world_view_proj_matrix().abs_diff_eq(expected, 1e-6));
}

#[test]
fn test_projection_depth_range() {
    let projection = constants::projection_matrix(1.0);
    let near = projection.project_point3(Vec3::new(0.0, 0.0, 1.0));
    let far = projection.project_point3(Vec3::new(0.0, 0.0, 100.0));
    assert!((near.z - 0.0).abs() < 1e-5);
    assert!((far.z - 1.0).abs() < 1e-5);
}

#[test]
fn test_recorded_command_order() {
    let gpu = FakeGpu::new();
    let scheduler = FrameScheduler::new(&gpu);
    let mut recorder = FrameRecorder::new(800, 600, [0.0, 0.2, 0.4, 1.0]);

    let token = scheduler.begin_frame(&gpu).unwrap();
    let list = recorder.record(token, 36).unwrap();

    let expected = vec![
        Command::SetRootSignature,
        Command::SetDescriptorTable(DescriptorTable::SceneConstants),
        Command::SetDescriptorTable(DescriptorTable::Texture),
        Command::SetViewport(commands::Viewport::full(800, 600)),
        Command::SetScissor(commands::ScissorRect::full(800, 600)),
        Command::Transition {
            back_buffer: 0,
            before: ResourceState::Present,
            after: ResourceState::RenderTarget,
        },
        Command::SetRenderTargets {
            back_buffer: 0,
            depth: true,
        },
        Command::ClearRenderTarget {
            back_buffer: 0,
            color: [0.0, 0.2, 0.4, 1.0],
        },
        Command::ClearDepth { depth: 1.0 },
        Command::SetVertexBuffer { vertex_count: 36 },
        Command::Draw {
            vertex_count: 36,
            instance_count: 1,
        },
        Command::Transition {
            back_buffer: 0,
            before: ResourceState::RenderTarget,
            after: ResourceState::Present,
        },
    ];
    assert!(list.is_closed());
    assert_eq!(list.commands(), expected.as_slice());
}

#[test]
fn test_recorder_reuses_list() {
    let mut gpu = FakeGpu::new();
    let mut scheduler = FrameScheduler::new(&gpu);
    let mut recorder = FrameRecorder::new(64, 64, [0.0; 4]);

    for _ in 0..3 {
        let token = scheduler.begin_frame(&gpu).unwrap();
        assert_eq!(recorder.record(token, 3).unwrap().len(), 12);
        scheduler.end_frame(&mut gpu).unwrap();
    }
}

#[test]
fn test_missing_closing_transition_rejected() {
    let mut list = CommandList::new(FRAME_COUNT);
    list.push(Command::Transition {
        back_buffer: 1,
        before: ResourceState::Present,
        after: ResourceState::RenderTarget,
    })
    .unwrap();

    assert_eq!(
        list.close(),
        Err(RecordError::NotPresentable {
            index: 1,
            actual: ResourceState::RenderTarget,
        })
    );
    assert!(!list.is_closed());
}

#[test]
fn test_transition_state_mismatch() {
    let mut list = CommandList::new(FRAME_COUNT);
    list.push(Command::Transition {
        back_buffer: 0,
        before: ResourceState::RenderTarget,
        after: ResourceState::Present,
    })
    .unwrap();

    assert_eq!(
        list.close(),
        Err(RecordError::StateMismatch {
            index: 0,
            expected: ResourceState::RenderTarget,
            actual: ResourceState::Present,
        })
    );
}

#[test]
fn test_render_target_requires_transition() {
    let mut tracker = ResourceStateTracker::new(FRAME_COUNT);
    assert_eq!(
        tracker.apply(&Command::ClearRenderTarget {
            back_buffer: 0,
            color: [0.0; 4],
        }),
        Err(RecordError::NotRenderTarget {
            index: 0,
            actual: ResourceState::Present,
        })
    );
    assert_eq!(
        tracker.apply(&Command::ClearDepth { depth: 1.0 }),
        Err(RecordError::NoRenderTarget("ClearDepth"))
    );
    assert_eq!(
        tracker.apply(&Command::SetRenderTargets {
            back_buffer: 2,
            depth: true,
        }),
        Err(RecordError::NoSuchBackBuffer { index: 2, count: 2 })
    );
}

#[test]
fn test_draw_validation() {
    let mut tracker = ResourceStateTracker::new(FRAME_COUNT);
    let draw = Command::Draw {
        vertex_count: 6,
        instance_count: 1,
    };

    assert_eq!(tracker.apply(&draw), Err(RecordError::NoRenderTarget("Draw")));

    tracker
        .apply(&Command::Transition {
            back_buffer: 0,
            before: ResourceState::Present,
            after: ResourceState::RenderTarget,
        })
        .unwrap();
    tracker
        .apply(&Command::SetRenderTargets {
            back_buffer: 0,
            depth: true,
        })
        .unwrap();
    assert_eq!(tracker.apply(&draw), Err(RecordError::NoVertexBuffer));

    tracker.apply(&Command::SetVertexBuffer { vertex_count: 3 }).unwrap();
    assert_eq!(
        tracker.apply(&draw),
        Err(RecordError::DrawOutOfRange {
            requested: 6,
            available: 3,
        })
    );

    tracker.apply(&Command::SetVertexBuffer { vertex_count: 6 }).unwrap();
    assert_eq!(tracker.apply(&draw), Ok(()));
    assert_eq!(tracker.state(0), Some(ResourceState::RenderTarget));
}

#[test]
fn test_closed_list_rejects_commands() {
    let mut list = CommandList::new(FRAME_COUNT);
    list.push(Command::SetRootSignature).unwrap();
    list.close().unwrap();

    assert_eq!(list.push(Command::SetRootSignature), Err(RecordError::ListClosed));
    assert_eq!(list.close(), Err(RecordError::ListClosed));

    list.reset();
    assert!(list.is_empty());
    assert!(!list.is_closed());
}

#[test]
fn test_tick_call_order() {
    let gpu = FakeGpu::new();
    let handle = gpu.clone();
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    renderer.tick().unwrap();
    assert_eq!(
        handle.state().calls,
        vec![
            GpuCall::Upload,
            GpuCall::Execute,
            GpuCall::Present,
            GpuCall::Signal(1),
        ]
    );
}

#[test]
fn test_fence_strictly_increasing() {
    let gpu = FakeGpu::lagging();
    let handle = gpu.clone();
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    for expected in 1..=5 {
        let report = renderer.tick().unwrap();
        assert_eq!(report.signaled, expected);
    }

    assert_eq!(signals(&handle.state().calls), vec![1, 2, 3, 4, 5]);
    assert_eq!(renderer.scheduler().fence_value(), 6);
    assert_eq!(renderer.frames(), 5);
}

#[test]
fn test_no_wait_when_caught_up() {
    let gpu = FakeGpu::new();
    let handle = gpu.clone();
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    for _ in 0..3 {
        assert!(!renderer.tick().unwrap().waited);
    }
    assert!(!handle
        .state()
        .calls
        .iter()
        .any(|c| matches!(c, GpuCall::Wait(_))));
}

#[test]
fn test_waits_when_gpu_behind() {
    let gpu = FakeGpu::lagging();
    let handle = gpu.clone();
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    assert!(renderer.tick().unwrap().waited);
    assert!(renderer.tick().unwrap().waited);

    let state = handle.state();
    let tail = &state.calls[state.calls.len() - 2..];
    assert_eq!(tail, &[GpuCall::Signal(2), GpuCall::Wait(2)]);
    assert_eq!(state.completed, 2);
}

#[test]
fn test_frame_index_alternates() {
    let gpu = FakeGpu::lagging();
    let handle = gpu.clone();
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    let reported: Vec<usize> = (0..4).map(|_| renderer.tick().unwrap().frame_index).collect();
    assert_eq!(reported, vec![1, 0, 1, 0]);

    let targets: Vec<usize> = handle.state().lists.iter().map(|l| render_target(l)).collect();
    assert_eq!(targets, vec![0, 1, 0, 1]);
}

#[test]
fn test_frame_index_resynced_from_surface() {
    let gpu = FakeGpu::new();
    let handle = gpu.clone();
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    // The surface hands back buffer 0 again instead of rotating
    handle.state().next_back_buffer = Some(0);
    assert_eq!(renderer.tick().unwrap().frame_index, 0);
    renderer.tick().unwrap();

    let targets: Vec<usize> = handle.state().lists.iter().map(|l| render_target(l)).collect();
    assert_eq!(targets, vec![0, 0]);
}

#[test]
fn test_sync_failure_is_fatal() {
    let gpu = FakeGpu::lagging();
    let handle = gpu.clone();
    handle.state().stalled = true;
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    assert!(matches!(
        renderer.tick(),
        Err(RenderError::Sync {
            value: 1,
            completed: 0
        })
    ));

    // The frame never retired, so the next one may not start recording
    assert!(matches!(
        renderer.tick(),
        Err(RenderError::FrameInFlight {
            pending: 1,
            completed: 0
        })
    ));
    assert_eq!(handle.state().lists.len(), 1);
    // Nor may it overwrite the constants the stalled frame still reads
    assert_eq!(handle.state().uploads.len(), 1);
}

#[test]
fn test_shutdown_waits_for_outstanding_frame() {
    let gpu = FakeGpu::lagging();
    let handle = gpu.clone();
    handle.state().stalled = true;
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());
    assert!(renderer.tick().is_err());

    handle.state().stalled = false;
    renderer.shutdown().unwrap();
    assert!(renderer.is_shut_down());
    {
        let state = handle.state();
        let tail = &state.calls[state.calls.len() - 2..];
        assert_eq!(tail, &[GpuCall::Signal(2), GpuCall::Wait(2)]);
        assert_eq!(state.completed, 2);
    }

    // A second shutdown has nothing left to do
    let calls = handle.state().calls.len();
    renderer.shutdown().unwrap();
    assert_eq!(handle.state().calls.len(), calls);
}

#[test]
fn test_drop_flushes_gpu() {
    let gpu = FakeGpu::lagging();
    let handle = gpu.clone();
    handle.state().stalled = true;
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());
    assert!(renderer.tick().is_err());

    handle.state().stalled = false;
    drop(renderer);
    assert_eq!(handle.state().completed, 2);
}

#[test]
fn test_shutdown_waits_for_unsignaled_submission() {
    let gpu = FakeGpu::lagging();
    let handle = gpu.clone();
    handle.state().fail_present = true;
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    // Work was submitted but the frame died before its fence signal
    assert!(matches!(
        renderer.tick(),
        Err(RenderError::Surface(wgpu::SurfaceError::Lost))
    ));
    assert_eq!(handle.state().calls, vec![GpuCall::Upload, GpuCall::Execute]);

    renderer.shutdown().unwrap();
    let state = handle.state();
    assert_eq!(
        state.calls,
        vec![
            GpuCall::Upload,
            GpuCall::Execute,
            GpuCall::Signal(1),
            GpuCall::Wait(1),
        ]
    );
    assert_eq!(state.completed, 1);
}

#[test]
fn test_present_failure_stops_frame() {
    let gpu = FakeGpu::new();
    let handle = gpu.clone();
    handle.state().fail_present = true;
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    assert!(matches!(
        renderer.tick(),
        Err(RenderError::Surface(wgpu::SurfaceError::Lost))
    ));
    assert!(signals(&handle.state().calls).is_empty());
}

#[test]
fn test_identical_input_gives_identical_constants() {
    let gpu = FakeGpu::new();
    let handle = gpu.clone();
    let mut renderer = renderer_with(gpu, &ViewerConfig::default());

    renderer.tick().unwrap();
    renderer.tick().unwrap();

    let state = handle.state();
    assert_eq!(state.uploads.len(), 2);
    assert_eq!(state.uploads[0].as_bytes(), state.uploads[1].as_bytes());
}

#[test]
fn test_spin_animates_constants() {
    let config = ViewerConfig {
        spin: true,
        ..ViewerConfig::default()
    };
    let gpu = FakeGpu::new();
    let handle = gpu.clone();
    let mut renderer = renderer_with(gpu, &config);

    renderer.tick().unwrap();
    renderer.tick().unwrap();

    let state = handle.state();
    assert_ne!(state.uploads[0], state.uploads[1]);
}

#[test]
fn test_default_placement_in_front_of_camera() {
    let mut renderer = renderer_with(FakeGpu::new(), &ViewerConfig::default());
    renderer.tick().unwrap();

    let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, 4.0));
    assert!(renderer.constants().world_view_matrix().abs_diff_eq(expected, 1e-6));
}

#[test]
fn test_input_moves_camera() {
    let mut renderer = renderer_with(FakeGpu::new(), &ViewerConfig::default());

    renderer.input_mut().process_key(KeyCode::KeyW, true);
    renderer.tick().unwrap();
    renderer.tick().unwrap();
    assert!((renderer.scene().camera.position().z - 0.2).abs() < 1e-6);

    // World-view follows the camera: the model appears closer
    let z = renderer.constants().world_view_matrix().w_axis.z;
    assert!((z - 3.8).abs() < 1e-5);

    renderer.input_mut().process_key(KeyCode::KeyW, false);
    renderer.input_mut().process_key(KeyCode::KeyR, true);
    renderer.tick().unwrap();
    assert_eq!(renderer.scene().camera.position(), Vec3::ZERO);
}

#[test]
fn test_empty_mesh_rejected() {
    let result = Renderer::new(
        FakeGpu::new(),
        Mesh::new("empty"),
        material(),
        &ViewerConfig::default(),
    );
    assert!(matches!(result, Err(RenderError::ResourceCreation(_))));
}

#[test]
fn test_pass_plan_from_recorded_list() {
    let gpu = FakeGpu::new();
    let scheduler = FrameScheduler::new(&gpu);
    let mut recorder = FrameRecorder::new(320, 240, [0.5; 4]);
    let token = scheduler.begin_frame(&gpu).unwrap();
    let plan = commands::PassPlan::from_list(recorder.record(token, 9).unwrap()).unwrap();

    assert_eq!(plan.back_buffer, 0);
    assert!(plan.depth);
    assert_eq!(
        plan.tables,
        vec![DescriptorTable::SceneConstants, DescriptorTable::Texture]
    );
    assert_eq!(plan.viewport, Some(commands::Viewport::full(320, 240)));
    assert_eq!(plan.clear_color, Some([0.5; 4]));
    assert_eq!(plan.clear_depth, Some(1.0));
    assert_eq!(plan.draws, vec![(9, 1)]);
}

#[test]
fn test_pass_plan_requires_closed_list() {
    let mut list = CommandList::new(FRAME_COUNT);
    list.push(Command::SetRootSignature).unwrap();
    assert_eq!(
        commands::PassPlan::from_list(&list),
        Err(RecordError::ListOpen)
    );

    list.close().unwrap();
    assert_eq!(
        commands::PassPlan::from_list(&list),
        Err(RecordError::NoRenderTarget("render pass"))
    );
}
