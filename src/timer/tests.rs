use {
    super::FrameTimer,
    std::time::{Duration, Instant},
};

#[test]
fn ticks_once_per_interval() {
    let start = Instant::now();
    let ms = Duration::from_millis;
    let mut timer = FrameTimer::new(ms(16), start);
    assert!(!timer.poll(start + ms(10)));
    assert_eq!(timer.timeout(start + ms(10)), ms(6));
    assert!(timer.poll(start + ms(16)));
    assert!(!timer.poll(start + ms(20)));
    assert!(timer.poll(start + ms(32)));
}

#[test]
fn skips_missed_ticks() {
    let start = Instant::now();
    let ms = Duration::from_millis;
    let mut timer = FrameTimer::new(ms(10), start);
    assert!(timer.poll(start + ms(55)));
    assert!(!timer.poll(start + ms(55)));
    assert_eq!(timer.timeout(start + ms(55)), ms(5));
}
