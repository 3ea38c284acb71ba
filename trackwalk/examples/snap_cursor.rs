//! Sweep the cursor along a line and show where it snaps in the track tool.

use trackwalk::prelude::*;
use trackwalk::{Size2D, Tool};

fn main() {
    let mut board = Board::new("snap_demo", 2);
    let front = LayerMask::from_layer(LayerId::FRONT);
    board.add_pad(Pad::new("U1", "1", Point::new(0, 0), Size2D::square(60), front, 1));
    board.store.push(Segment::track(
        "bus",
        Point::new(0, 0),
        Point::new(400, 200),
        20,
        LayerId::FRONT,
        1,
    ));
    let drawn = board.store.push(Segment::track(
        "new",
        Point::new(200, 400),
        Point::new(200, 300),
        20,
        LayerId::FRONT,
        1,
    ));

    let settings = MagneticSettings::default();
    for x in (0..=400).step_by(50) {
        let cursor = Point::new(x, x / 2 + 3);
        let ctx = SnapContext::new(cursor, LayerId::FRONT, Size2D::square(10))
            .with_tool(Tool::Track)
            .with_current_track(drawn);
        match magnetize(&board, &ctx, &settings) {
            Some(snap) => println!("{} -> {} ({:?})", cursor, snap.point, snap.target),
            None => println!("{} -> no snap", cursor),
        }
    }
}
