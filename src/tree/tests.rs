use {
    crate::{
        config::ServerConfig,
        display::DisplayId,
        event::{EventKind, EventMask, FocusMode, PropertyState},
        rect::Rect,
        tree::{
            Atom, FrameHit, PropertyError, PropertyMode, ReparentError, StackMode, WindowAttributes,
            WindowChanges, WindowClass, WindowId, WindowTree,
        },
    },
    bstr::ByteSlice,
};

const D: DisplayId = DisplayId::NONE;

fn display() -> DisplayId {
    DisplayId::from_raw(1)
}

fn tree() -> WindowTree {
    let mut tree = WindowTree::new(&ServerConfig::default());
    tree.take_notifications();
    for e in tree.take_exposures() {
        tree.pool.release(e.region);
    }
    tree
}

fn create(tree: &mut WindowTree, parent: WindowId, x: i32, y: i32, w: i32, h: i32) -> WindowId {
    tree.create_window(
        display(),
        parent,
        x,
        y,
        w,
        h,
        0,
        WindowClass::InputOutput,
        &WindowAttributes::default(),
    )
    .unwrap()
}

fn events(tree: &mut WindowTree) -> Vec<(WindowId, EventKind)> {
    tree.take_notifications()
        .into_iter()
        .map(|n| (n.window, n.kind))
        .collect()
}

fn children(tree: &WindowTree, id: WindowId) -> Vec<WindowId> {
    tree.query_tree(id).unwrap().children
}

/// Every pixel in the visible region of a window lies inside the window and
/// the screen, and no other window claims it.
fn check_visible(tree: &WindowTree) {
    let screen = tree.screen_rect();
    let ids: Vec<_> = (0..tree.slots.len() as u32)
        .filter(|&i| tree.slots[i as usize].window.is_some())
        .map(|i| tree.id_of(i))
        .collect();
    for id in ids {
        let visible = tree.visible_region(id).unwrap();
        if !tree.is_viewable(id) {
            assert!(visible.is_empty(), "{id} is not viewable");
            continue;
        }
        let (ox, oy) = tree.origin(id).unwrap();
        let g = tree.get_geometry(id).unwrap();
        let interior = Rect::new_sized(ox, oy, g.width, g.height);
        for r in visible.iter() {
            assert!(interior.contains_rect(r), "{id}: {r:?} outside of {interior:?}");
            assert!(screen.contains_rect(r), "{id}: {r:?} outside of the screen");
            for y in (r.y1()..r.y2()).step_by(3) {
                for x in (r.x1()..r.x2()).step_by(3) {
                    assert_eq!(tree.window_at(x, y), id, "({x}, {y})");
                }
            }
        }
    }
}

#[test]
fn map_exposes_window() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 10, 10, 100, 50);
    tree.select_input(display(), w, EventMask::EXPOSURE | EventMask::STRUCTURE_NOTIFY);
    tree.map_window(w);
    assert_eq!(
        events(&mut tree),
        vec![
            (
                w,
                EventKind::MapNotify {
                    window: w,
                    override_redirect: false,
                }
            ),
            (
                w,
                EventKind::Expose {
                    rect: Rect::new_sized(0, 0, 100, 50),
                    count: 0,
                }
            ),
        ]
    );
    let exposures = tree.take_exposures();
    assert_eq!(exposures.len(), 1);
    assert_eq!(exposures[0].window, w);
    assert_eq!(exposures[0].region.extents(), Rect::new_sized(10, 10, 100, 50));
    check_visible(&tree);
}

#[test]
fn siblings_occlude() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 100, 100);
    let b = create(&mut tree, root, 50, 50, 100, 100);
    tree.map_window(a);
    tree.map_window(b);
    let va = tree.visible_region(a).unwrap();
    assert!(va.contains(10, 10));
    assert!(!va.contains(60, 60));
    assert!(tree.visible_region(b).unwrap().contains(60, 60));
    check_visible(&tree);

    tree.select_input(display(), a, EventMask::EXPOSURE);
    tree.take_notifications();
    tree.raise_window(a);
    assert_eq!(
        events(&mut tree),
        vec![(
            a,
            EventKind::Expose {
                rect: Rect::new_sized(50, 50, 50, 50),
                count: 0,
            }
        )]
    );
    assert!(!tree.visible_region(b).unwrap().contains(60, 60));
    check_visible(&tree);
}

#[test]
fn expose_counts_down() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 100, 100);
    let b = create(&mut tree, root, 20, 20, 20, 20);
    tree.map_window(a);
    tree.map_window(b);
    tree.select_input(display(), a, EventMask::EXPOSURE);
    tree.unmap_window(b);
    tree.map_window(b);
    tree.take_notifications();
    tree.unmap_window(a);
    tree.map_window(a);
    let counts: Vec<_> = events(&mut tree)
        .into_iter()
        .filter_map(|(_, k)| k.expose_count())
        .collect();
    assert_eq!(counts.len(), 4);
    assert_eq!(counts, vec![3, 2, 1, 0]);
}

#[test]
fn children_are_clipped_by_parent() {
    let mut tree = tree();
    let root = tree.root();
    let parent = create(&mut tree, root, 10, 10, 50, 50);
    let child = create(&mut tree, parent, 40, 40, 50, 50);
    tree.map_window(child);
    assert!(tree.visible_region(child).unwrap().is_empty());
    tree.map_window(parent);
    let visible = tree.visible_region(child).unwrap();
    assert_eq!(visible.extents(), Rect::new_sized(50, 50, 10, 10));
    assert!(!tree.visible_region(parent).unwrap().contains(55, 55));
    check_visible(&tree);
}

#[test]
fn input_only_windows_do_not_occlude() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 100, 100);
    let io = tree
        .create_window(
            display(),
            root,
            0,
            0,
            100,
            100,
            5,
            WindowClass::InputOnly,
            &WindowAttributes::default(),
        )
        .unwrap();
    assert_eq!(tree.get_geometry(io).unwrap().border_width, 0);
    tree.map_window(a);
    tree.map_window(io);
    assert!(tree.visible_region(a).unwrap().contains(50, 50));
    assert!(tree.visible_region(io).unwrap().is_empty());
    assert_eq!(tree.window_at(50, 50), io);
    let child = tree.create_window(
        display(),
        io,
        0,
        0,
        10,
        10,
        0,
        WindowClass::InputOutput,
        &WindowAttributes::default(),
    );
    assert_eq!(child, None);
}

#[test]
fn restack_modes() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 50, 50);
    let b = create(&mut tree, root, 25, 25, 50, 50);
    let c = create(&mut tree, root, 200, 200, 10, 10);
    for w in [a, b, c] {
        tree.map_window(w);
    }
    assert_eq!(children(&tree, root), vec![a, b, c]);

    tree.restack_window(a, None, StackMode::TopIf);
    assert_eq!(children(&tree, root), vec![b, c, a]);

    tree.restack_window(c, None, StackMode::TopIf);
    assert_eq!(children(&tree, root), vec![b, c, a]);

    tree.restack_window(a, None, StackMode::BottomIf);
    assert_eq!(children(&tree, root), vec![a, b, c]);

    tree.restack_window(b, Some(a), StackMode::Opposite);
    assert_eq!(children(&tree, root), vec![b, a, c]);

    tree.restack_window(c, Some(b), StackMode::Below);
    assert_eq!(children(&tree, root), vec![c, b, a]);

    tree.restack_window(c, Some(a), StackMode::Above);
    assert_eq!(children(&tree, root), vec![b, a, c]);

    tree.lower_window(c);
    assert_eq!(children(&tree, root), vec![c, b, a]);
    check_visible(&tree);
}

#[test]
fn restack_relative_to_non_sibling_is_ignored() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 50, 50);
    let b = create(&mut tree, root, 25, 25, 50, 50);
    let nested = create(&mut tree, a, 0, 0, 10, 10);
    tree.select_input(display(), a, EventMask::STRUCTURE_NOTIFY);
    let changes = WindowChanges {
        x: Some(300),
        sibling: Some(nested),
        stack_mode: Some(StackMode::Above),
        ..Default::default()
    };
    tree.configure_window(a, &changes);
    assert_eq!(children(&tree, root), vec![a, b]);
    assert_eq!(tree.get_geometry(a).unwrap().x, 0);
    assert!(events(&mut tree).is_empty());
}

#[test]
fn configure_notifies_and_clamps() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 50, 50);
    let b = create(&mut tree, root, 100, 100, 50, 50);
    tree.select_input(display(), b, EventMask::STRUCTURE_NOTIFY);
    tree.select_input(display(), root, EventMask::SUBSTRUCTURE_NOTIFY);
    let changes = WindowChanges {
        x: Some(5),
        width: Some(0),
        border_width: Some(2),
        ..Default::default()
    };
    tree.configure_window(b, &changes);
    let g = tree.get_geometry(b).unwrap();
    assert_eq!((g.x, g.width, g.border_width), (5, 1, 2));
    let expected = EventKind::ConfigureNotify {
        window: b,
        rect: Rect::new_sized(5, 100, 5, 54),
        border_width: 2,
        above_sibling: Some(a),
        override_redirect: false,
    };
    assert_eq!(events(&mut tree), vec![(b, expected.clone()), (root, expected)]);
    tree.configure_window(b, &changes);
    assert!(events(&mut tree).is_empty());
}

#[test]
fn huge_geometry_is_clamped() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 0, 0, 10, 10);
    tree.map_window(w);
    let changes = WindowChanges {
        x: Some(i32::MIN),
        y: Some(i32::MAX),
        width: Some(i32::MAX),
        height: Some(i32::MAX),
        border_width: Some(i32::MAX),
        ..Default::default()
    };
    tree.configure_window(w, &changes);
    let g = tree.get_geometry(w).unwrap();
    assert_eq!(
        (g.x, g.y, g.width, g.height, g.border_width),
        (-32768, 32767, 32767, 32767, 32767)
    );
    let child = tree
        .create_window(
            display(),
            w,
            i32::MAX,
            i32::MAX,
            i32::MAX,
            i32::MAX,
            i32::MAX,
            WindowClass::InputOutput,
            &WindowAttributes::default(),
        )
        .unwrap();
    tree.map_window(child);
    let g = tree.get_geometry(child).unwrap();
    assert_eq!((g.x, g.width, g.border_width), (32767, 32767, 32767));
    check_visible(&tree);
}

#[test]
fn huge_framed_geometry_is_clamped() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 100, 100, 200, 150);
    tree.set_wrapper(w, true);
    tree.map_window(w);
    let frame = tree.frame_window_of(w).unwrap();
    let changes = WindowChanges {
        width: Some(i32::MAX),
        border_width: Some(2),
        ..Default::default()
    };
    tree.configure_window(w, &changes);
    let wg = tree.get_geometry(w).unwrap();
    assert_eq!((wg.width, wg.border_width), (32767, 2));
    assert_eq!(tree.get_geometry(frame).unwrap().width, 32767);
    tree.resize_frame(frame, i32::MAX, i32::MAX, false);
    assert_eq!(tree.get_geometry(frame).unwrap().width, 32767);
    check_visible(&tree);
}

#[test]
fn map_unmap_destroy_are_idempotent() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 0, 0, 10, 10);
    tree.select_input(display(), w, EventMask::STRUCTURE_NOTIFY);
    tree.map_window(w);
    tree.map_window(w);
    assert_eq!(events(&mut tree).len(), 1);
    tree.unmap_window(w);
    tree.unmap_window(w);
    assert_eq!(
        events(&mut tree),
        vec![(w, EventKind::UnmapNotify { window: w })]
    );
    tree.destroy_window(w);
    assert_eq!(
        events(&mut tree),
        vec![(w, EventKind::DestroyNotify { window: w })]
    );
    tree.destroy_window(w);
    assert!(events(&mut tree).is_empty());
    assert!(!tree.contains(w));
    tree.destroy_window(root);
    assert!(tree.contains(root));
}

#[test]
fn destroy_notifies_children_first() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 50, 50);
    let b = create(&mut tree, a, 0, 0, 10, 10);
    let c = create(&mut tree, b, 0, 0, 5, 5);
    tree.select_input(display(), a, EventMask::STRUCTURE_NOTIFY);
    tree.select_input(display(), b, EventMask::STRUCTURE_NOTIFY);
    tree.select_input(display(), c, EventMask::STRUCTURE_NOTIFY);
    tree.destroy_window(a);
    let destroyed: Vec<_> = events(&mut tree)
        .into_iter()
        .filter_map(|(_, k)| match k {
            EventKind::DestroyNotify { window } => Some(window),
            _ => None,
        })
        .collect();
    assert_eq!(destroyed, vec![c, b, a]);
    assert_eq!(tree.len(), 1);
}

#[test]
fn stale_ids_are_rejected() {
    let mut tree = tree();
    let root = tree.root();
    let old = create(&mut tree, root, 0, 0, 10, 10);
    tree.destroy_window(old);
    let new = create(&mut tree, root, 0, 0, 10, 10);
    assert_ne!(old, new);
    assert!(!tree.contains(old));
    assert_eq!(tree.get_geometry(old), None);
    tree.map_window(old);
    assert!(!tree.is_mapped(new));
}

#[test]
fn reparent() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 50, 50);
    let b = create(&mut tree, a, 10, 10, 20, 20);
    tree.map_window(a);
    tree.map_window(b);
    assert_eq!(tree.reparent_window(a, b, 0, 0), Err(ReparentError::Cycle(a, b)));
    assert_eq!(tree.reparent_window(a, a, 0, 0), Err(ReparentError::Cycle(a, a)));
    assert_eq!(tree.reparent_window(root, a, 0, 0), Err(ReparentError::Root));

    tree.select_input(display(), b, EventMask::STRUCTURE_NOTIFY);
    tree.reparent_window(b, root, 5, 5).unwrap();
    assert_eq!(tree.parent(b), Some(root));
    assert_eq!(tree.origin(b), Some((5, 5)));
    assert_eq!(
        events(&mut tree),
        vec![
            (b, EventKind::UnmapNotify { window: b }),
            (
                b,
                EventKind::ReparentNotify {
                    window: b,
                    parent: root,
                    x: 5,
                    y: 5,
                    override_redirect: false,
                }
            ),
            (
                b,
                EventKind::MapNotify {
                    window: b,
                    override_redirect: false,
                }
            ),
        ]
    );
    assert_eq!(children(&tree, root), vec![a, b]);
    check_visible(&tree);
}

#[test]
fn focus_reverts_after_unmap() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 0, 0, 50, 50);
    let b = create(&mut tree, a, 10, 10, 20, 20);
    tree.map_window(a);
    tree.map_window(b);
    tree.select_input(display(), root, EventMask::FOCUS_CHANGE);
    tree.select_input(display(), a, EventMask::STRUCTURE_NOTIFY);
    tree.select_input(display(), b, EventMask::FOCUS_CHANGE);
    tree.set_input_focus(b);
    assert_eq!(
        events(&mut tree),
        vec![
            (root, EventKind::FocusOut { mode: FocusMode::Normal }),
            (b, EventKind::FocusIn { mode: FocusMode::Normal }),
        ]
    );
    tree.unmap_window(a);
    assert_eq!(
        events(&mut tree),
        vec![
            (a, EventKind::UnmapNotify { window: a }),
            (b, EventKind::FocusOut { mode: FocusMode::Revert }),
            (root, EventKind::FocusIn { mode: FocusMode::Revert }),
        ]
    );
    assert_eq!(tree.focus(), root);

    // Unviewable windows cannot take the focus.
    tree.set_input_focus(b);
    assert_eq!(tree.focus(), root);
}

#[test]
fn frame_lifecycle() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 100, 100, 200, 150);
    tree.set_wrapper(w, true);
    tree.map_window(w);
    let frame = tree.frame_window_of(w).unwrap();
    assert!(tree.is_frame(frame));
    assert_eq!(tree.wrapper_of_frame(frame), Some(w));
    assert_eq!(tree.parent(frame), Some(root));
    assert_eq!(tree.parent(w), Some(frame));
    let fg = tree.get_geometry(frame).unwrap();
    assert_eq!((fg.x, fg.y, fg.width, fg.height), (100, 100, 208, 171));
    let wg = tree.get_geometry(w).unwrap();
    assert_eq!((wg.x, wg.y, wg.width, wg.height), (4, 17, 200, 150));
    assert_eq!(tree.origin(w), Some((104, 117)));
    assert!(tree.is_viewable(w));
    assert!(tree.is_viewable(frame));
    check_visible(&tree);

    assert_eq!(tree.frame_hit(frame, 2, 50), Some(FrameHit::Left));
    assert_eq!(tree.frame_hit(frame, 205, 50), Some(FrameHit::Right));
    assert_eq!(tree.frame_hit(frame, 100, 169), Some(FrameHit::Bottom));
    assert_eq!(tree.frame_hit(frame, 1, 170), Some(FrameHit::BottomLeft));
    assert_eq!(tree.frame_hit(frame, 207, 170), Some(FrameHit::BottomRight));
    assert_eq!(tree.frame_hit(frame, 10, 5), Some(FrameHit::Title));
    assert_eq!(tree.frame_hit(frame, 190, 5), Some(FrameHit::Close));
    assert_eq!(tree.frame_hit(frame, 100, 100), None);
    assert_eq!(tree.frame_hit(w, 10, 5), None);

    tree.unmap_window(w);
    assert!(!tree.is_mapped(frame));
    tree.map_window(w);
    assert!(tree.is_mapped(frame));
    assert_eq!(tree.frame_window_of(w), Some(frame));

    tree.destroy_window(w);
    assert!(!tree.contains(frame));
    assert_eq!(tree.len(), 1);
}

#[test]
fn override_redirect_windows_are_not_framed() {
    let mut tree = tree();
    let root = tree.root();
    let attrs = WindowAttributes {
        override_redirect: true,
        ..Default::default()
    };
    let w = tree
        .create_window(display(), root, 0, 0, 10, 10, 0, WindowClass::InputOutput, &attrs)
        .unwrap();
    tree.set_wrapper(w, true);
    tree.map_window(w);
    assert_eq!(tree.frame_window_of(w), None);
    assert_eq!(tree.parent(w), Some(root));
}

#[test]
fn framed_configure() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 100, 100, 200, 150);
    tree.set_wrapper(w, true);
    tree.map_window(w);
    let frame = tree.frame_window_of(w).unwrap();
    tree.select_input(display(), w, EventMask::STRUCTURE_NOTIFY);
    tree.take_notifications();

    let changes = WindowChanges {
        x: Some(10),
        y: Some(20),
        ..Default::default()
    };
    tree.configure_window(w, &changes);
    let fg = tree.get_geometry(frame).unwrap();
    assert_eq!((fg.x, fg.y), (10, 20));
    let wg = tree.get_geometry(w).unwrap();
    assert_eq!((wg.x, wg.y), (4, 17));
    let notifications = tree.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].send_event);
    assert_eq!(
        notifications[0].kind,
        EventKind::ConfigureNotify {
            window: w,
            rect: Rect::new_sized(14, 37, 200, 150),
            border_width: 0,
            above_sibling: None,
            override_redirect: false,
        }
    );

    let changes = WindowChanges {
        width: Some(300),
        ..Default::default()
    };
    tree.configure_window(w, &changes);
    assert_eq!(tree.get_geometry(w).unwrap().width, 300);
    assert_eq!(tree.get_geometry(frame).unwrap().width, 308);
    let notifications = tree.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert!(!notifications[0].send_event);
    check_visible(&tree);
}

#[test]
fn interactive_frame_move_and_resize() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 100, 100, 200, 150);
    tree.set_wrapper(w, true);
    tree.map_window(w);
    let frame = tree.frame_window_of(w).unwrap();
    tree.move_frame(frame, -20, 5);
    assert_eq!(tree.origin(w), Some((84, 122)));
    tree.resize_frame(frame, 10, 0, true);
    let fg = tree.get_geometry(frame).unwrap();
    assert_eq!((fg.x, fg.width), (70, 218));
    assert_eq!(tree.get_geometry(w).unwrap().width, 210);
    tree.resize_frame(frame, -1000, -1000, false);
    let wg = tree.get_geometry(w).unwrap();
    assert_eq!((wg.width, wg.height), (1, 1));
    check_visible(&tree);
}

#[test]
fn fullscreen_round_trip() {
    let mut tree = tree();
    let root = tree.root();
    let w = tree
        .create_window(
            display(),
            root,
            10,
            10,
            50,
            50,
            2,
            WindowClass::InputOutput,
            &WindowAttributes::default(),
        )
        .unwrap();
    let other = create(&mut tree, root, 0, 0, 30, 30);
    tree.map_window(w);
    tree.map_window(other);
    tree.set_fullscreen(w, true);
    assert!(tree.is_fullscreen(w));
    let g = tree.get_geometry(w).unwrap();
    assert_eq!((g.x, g.y, g.width, g.height, g.border_width), (0, 0, 800, 600, 0));
    assert_eq!(children(&tree, root).last(), Some(&w));
    check_visible(&tree);

    tree.resize_root(1024, 768);
    let g = tree.get_geometry(w).unwrap();
    assert_eq!((g.width, g.height), (1024, 768));

    tree.set_fullscreen(w, false);
    assert!(!tree.is_fullscreen(w));
    let g = tree.get_geometry(w).unwrap();
    assert_eq!((g.x, g.y, g.width, g.height, g.border_width), (10, 10, 50, 50, 2));
    check_visible(&tree);
}

#[test]
fn framed_fullscreen_round_trip() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 100, 100, 200, 150);
    tree.set_wrapper(w, true);
    tree.map_window(w);
    let frame = tree.frame_window_of(w).unwrap();
    tree.set_fullscreen(frame, true);
    assert!(tree.is_fullscreen(w));
    assert_eq!(tree.origin(w), Some((0, 0)));
    let wg = tree.get_geometry(w).unwrap();
    assert_eq!((wg.width, wg.height), (800, 600));
    let fg = tree.get_geometry(frame).unwrap();
    assert_eq!((fg.x, fg.y, fg.width, fg.height), (-4, -17, 808, 621));
    let visible = tree.visible_region(w).unwrap();
    assert_eq!(visible.extents(), Rect::new_sized(0, 0, 800, 600));
    assert!(tree.visible_region(frame).unwrap().is_empty());
    check_visible(&tree);

    tree.set_fullscreen(w, false);
    let fg = tree.get_geometry(frame).unwrap();
    assert_eq!((fg.x, fg.y, fg.width, fg.height), (100, 100, 208, 171));
    let wg = tree.get_geometry(w).unwrap();
    assert_eq!((wg.x, wg.y, wg.width, wg.height), (4, 17, 200, 150));
    check_visible(&tree);
}

#[test]
fn fullscreen_config_applies_to_new_frames() {
    let config = ServerConfig {
        fullscreen: true,
        ..Default::default()
    };
    let mut tree = WindowTree::new(&config);
    let root = tree.root();
    let w = create(&mut tree, root, 100, 100, 200, 150);
    tree.set_wrapper(w, true);
    tree.map_window(w);
    let frame = tree.frame_window_of(w).unwrap();
    assert!(tree.is_fullscreen(w));
    assert_eq!(tree.origin(w), Some((0, 0)));
    let wg = tree.get_geometry(w).unwrap();
    assert_eq!((wg.width, wg.height), (800, 600));
    let fg = tree.get_geometry(frame).unwrap();
    assert_eq!((fg.x, fg.y), (-4, -17));

    // Plain top-level windows are left alone.
    let plain = create(&mut tree, root, 10, 10, 30, 30);
    tree.map_window(plain);
    assert!(!tree.is_fullscreen(plain));

    // Leaving fullscreen restores the geometry the frame was created with.
    tree.set_fullscreen(w, false);
    let fg = tree.get_geometry(frame).unwrap();
    assert_eq!((fg.x, fg.y, fg.width, fg.height), (100, 100, 208, 171));
    tree.unmap_window(w);
    tree.map_window(w);
    assert!(!tree.is_fullscreen(w));
    check_visible(&tree);
}

#[test]
fn transients_are_raised_with_their_owner() {
    let mut tree = tree();
    let root = tree.root();
    let transient = create(&mut tree, root, 20, 20, 30, 30);
    let owner = create(&mut tree, root, 0, 0, 100, 100);
    tree.set_transient_for(transient, Some(owner));
    tree.map_window(transient);
    tree.map_window(owner);
    assert_eq!(children(&tree, root), vec![owner, transient]);
    check_visible(&tree);
}

#[test]
fn properties() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 100, 100, 200, 150);
    tree.set_wrapper(w, true);
    tree.map_window(w);
    let frame = tree.frame_window_of(w).unwrap();
    tree.select_input(display(), w, EventMask::PROPERTY_CHANGE);
    tree.take_notifications();

    let name = Atom::WM_NAME;
    let utf8 = Atom::UTF8_STRING;
    tree.change_property(w, name, utf8, 8, PropertyMode::Replace, b"hello")
        .unwrap();
    tree.change_property(w, name, utf8, 8, PropertyMode::Append, b" world")
        .unwrap();
    assert_eq!(tree.title(w).unwrap().to_str().unwrap(), "hello world");
    assert_eq!(tree.title(frame).unwrap().to_str().unwrap(), "hello world");
    assert_eq!(
        tree.change_property(w, name, utf8, 16, PropertyMode::Append, b"ab"),
        Err(PropertyError::Mismatch)
    );
    assert_eq!(
        tree.change_property(w, name, utf8, 7, PropertyMode::Replace, b"ab"),
        Err(PropertyError::InvalidFormat(7))
    );
    assert_eq!(
        tree.change_property(w, name, utf8, 32, PropertyMode::Replace, b"abc"),
        Err(PropertyError::InvalidLength(3))
    );
    let custom = tree.atoms.intern(b"_CUSTOM", false).unwrap();
    assert_eq!(tree.atoms.intern(b"_CUSTOM", true), Some(custom));
    assert_eq!(tree.atoms.intern(b"_MISSING", true), None);
    tree.change_property(w, custom, Atom::STRING, 8, PropertyMode::Replace, b"b")
        .unwrap();
    tree.change_property(w, custom, Atom::STRING, 8, PropertyMode::Prepend, b"a")
        .unwrap();
    assert_eq!(tree.list_properties(w), vec![name, custom]);

    let prop = tree.get_property(w, custom, true).unwrap();
    assert_eq!(prop.data, b"ab");
    assert_eq!(tree.get_property(w, custom, false), None);
    tree.delete_property(w, name);
    assert!(tree.title(w).unwrap().is_empty());

    let states: Vec<_> = events(&mut tree)
        .into_iter()
        .filter_map(|(_, k)| match k {
            EventKind::PropertyNotify { state, .. } => Some(state),
            _ => None,
        })
        .collect();
    use PropertyState::*;
    assert_eq!(states, vec![NewValue, NewValue, NewValue, NewValue, Deleted, Deleted]);
}

#[test]
fn translate_and_hit_test() {
    let mut tree = tree();
    let root = tree.root();
    let a = create(&mut tree, root, 10, 10, 100, 100);
    let b = create(&mut tree, a, 20, 20, 30, 30);
    tree.map_window(a);
    tree.map_window(b);
    assert_eq!(tree.translate_coordinates(b, root, 1, 2), Some((31, 32, Some(a))));
    assert_eq!(tree.translate_coordinates(root, a, 35, 35), Some((25, 25, Some(b))));
    assert_eq!(tree.translate_coordinates(root, a, 15, 15), Some((5, 5, None)));
    assert_eq!(tree.window_at(35, 35), b);
    assert_eq!(tree.window_at(15, 15), a);
    assert_eq!(tree.window_at(500, 500), root);
    assert_eq!(tree.ancestors(b), vec![b, a, root]);
}

#[test]
fn forgotten_displays_lose_selections() {
    let mut tree = tree();
    let root = tree.root();
    let w = create(&mut tree, root, 0, 0, 10, 10);
    tree.select_input(display(), w, EventMask::STRUCTURE_NOTIFY);
    tree.select_input(D, w, EventMask::STRUCTURE_NOTIFY);
    tree.forget_display(display());
    assert_eq!(tree.owner(w), None);
    tree.map_window(w);
    let displays: Vec<_> = tree.take_notifications().into_iter().map(|n| n.display).collect();
    assert_eq!(displays, vec![D]);
}
