use crate::rect::{
    Container, RectRaw,
    region::{contains, contains_rect, intersect, rects_to_bands, subtract, union},
};

fn r(x1: i32, y1: i32, x2: i32, y2: i32) -> RectRaw {
    RectRaw { x1, y1, x2, y2 }
}

#[test]
fn union_overlapping() {
    let mut res = Container::new();
    union(&[r(0, 0, 10, 10)], &[r(5, 5, 15, 15)], &mut res);
    assert_eq!(
        &res[..],
        &[r(0, 0, 10, 5), r(0, 5, 15, 10), r(5, 10, 15, 15)]
    );
}

#[test]
fn union_adjacent_merges() {
    let mut res = Container::new();
    union(&[r(0, 0, 10, 10)], &[r(0, 10, 10, 20)], &mut res);
    assert_eq!(&res[..], &[r(0, 0, 10, 20)]);
    union(&[r(0, 0, 10, 10)], &[r(10, 0, 20, 10)], &mut res);
    assert_eq!(&res[..], &[r(0, 0, 20, 10)]);
}

#[test]
fn subtract_hole() {
    let mut res = Container::new();
    subtract(&[r(0, 0, 20, 20)], &[r(5, 5, 15, 15)], &mut res);
    assert_eq!(
        &res[..],
        &[
            r(0, 0, 20, 5),
            r(0, 5, 5, 15),
            r(15, 5, 20, 15),
            r(0, 15, 20, 20),
        ]
    );
}

#[test]
fn subtract_everything() {
    let mut res = Container::new();
    subtract(&[r(0, 0, 20, 20)], &[r(0, 0, 20, 20)], &mut res);
    assert!(res.is_empty());
}

#[test]
fn intersect_partial() {
    let mut res = Container::new();
    intersect(&[r(0, 0, 10, 10)], &[r(5, 5, 15, 15)], &mut res);
    assert_eq!(&res[..], &[r(5, 5, 10, 10)]);
    intersect(&[r(0, 0, 10, 10)], &[r(10, 10, 15, 15)], &mut res);
    assert!(res.is_empty());
}

#[test]
fn bands_from_overlapping_rects() {
    let mut res = Container::new();
    rects_to_bands(
        &[r(0, 0, 10, 10), r(5, 0, 30, 10), r(30, 5, 50, 15)],
        &mut res,
    );
    assert_eq!(
        &res[..],
        &[r(0, 0, 30, 5), r(0, 5, 50, 10), r(30, 10, 50, 15)]
    );
}

#[test]
fn bands_merge_vertically() {
    let mut res = Container::new();
    rects_to_bands(&[r(0, 0, 10, 10), r(0, 10, 10, 20)], &mut res);
    assert_eq!(&res[..], &[r(0, 0, 10, 20)]);
}

#[test]
fn bands_skip_empty() {
    let mut res = Container::new();
    rects_to_bands(&[r(0, 0, 0, 10), r(3, 3, 4, 4)], &mut res);
    assert_eq!(&res[..], &[r(3, 3, 4, 4)]);
}

#[test]
fn point_and_rect_containment() {
    let mut res = Container::new();
    subtract(&[r(0, 0, 20, 20)], &[r(5, 5, 15, 15)], &mut res);
    assert!(contains(&res, 0, 0));
    assert!(contains(&res, 16, 10));
    assert!(!contains(&res, 10, 10));
    assert!(!contains(&res, 20, 0));
    assert!(contains_rect(&res, &r(0, 0, 20, 5)));
    assert!(contains_rect(&res, &r(0, 0, 5, 20)));
    assert!(!contains_rect(&res, &r(0, 0, 6, 6)));
}
