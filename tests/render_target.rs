mod common;

use photostrip::{BoothError, CaptureSession, FilterRegistry, LayoutRegistry, RenderTarget, Rgba8};

use common::{fontless, png};

#[tokio::test]
async fn renders_session_photos_into_layout() {
    let layouts = LayoutRegistry::builtin().unwrap();
    let layout = layouts.get("mini-strip").unwrap();

    let mut session = CaptureSession::new(3).unwrap();
    for c in [Rgba8::rgb(255, 0, 0), Rgba8::rgb(0, 255, 0), Rgba8::rgb(0, 0, 255)] {
        session.add_photo(png(30, 30, c), None).unwrap();
    }

    let mut target = RenderTarget::new(fontless());
    assert!(target.output().is_none());
    let out = target
        .render(session.raw_sources(), layout, None)
        .await
        .unwrap();
    assert_eq!((out.width(), out.height()), (400, 1200));
    assert_eq!(out.pixel(200, 200), Some(Rgba8::rgb(255, 0, 0)));
    assert_eq!(out.pixel(200, 900), Some(Rgba8::rgb(0, 0, 255)));
    assert_eq!(target.generation(), 1);
}

#[tokio::test]
async fn failures_leave_previous_output_untouched() {
    let layouts = LayoutRegistry::builtin().unwrap();
    let filters = FilterRegistry::builtin().unwrap();
    let layout = layouts.get("polaroid").unwrap();
    let warm = filters.get("warm").unwrap();

    let mut target = RenderTarget::new(fontless());
    target
        .render([png(10, 10, Rgba8::rgb(90, 60, 30))], layout, Some(warm))
        .await
        .unwrap();
    let good = target.output().cloned().unwrap();

    // Empty source: decode fails before anything is composed.
    let err = target
        .render([Vec::<u8>::new()], layout, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BoothError::Decode(_)));

    // Decodes fine, but polaroid has a single slot.
    let two = [png(2, 2, Rgba8::WHITE), png(2, 2, Rgba8::BLACK)];
    let err = target.render(two, layout, None).await.unwrap_err();
    assert!(matches!(err, BoothError::Composition(_)));

    assert_eq!(target.output(), Some(&good));
    assert_eq!(target.generation(), 1);
}

#[tokio::test]
async fn dropped_render_keeps_output() {
    let layouts = LayoutRegistry::builtin().unwrap();
    let layout = layouts.get("square-4").unwrap();

    let mut target = RenderTarget::new(fontless());
    target.render([png(4, 4, Rgba8::WHITE)], layout, None).await.unwrap();
    let good = target.output().cloned().unwrap();

    {
        let fut = target.render([png(4, 4, Rgba8::BLACK)], layout, None);
        drop(fut);
    }
    assert_eq!(target.output(), Some(&good));
    assert_eq!(target.generation(), 1);
}
