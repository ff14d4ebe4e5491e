use super::*;
use crate::error::ErrorKind;

#[test]
fn test_grid_shape_rejects_zero() {
    assert_eq!(
        GridShape::new(0, 2).unwrap_err().kind(),
        ErrorKind::InvalidConfig
    );
    assert!(GridShape::default().is_single());
}

#[test]
fn test_split_last_absorbs_remainder() {
    assert_eq!(split(10, 3), vec![(0, 3), (3, 3), (6, 4)]);
    assert_eq!(split(9, 3), vec![(0, 3), (3, 3), (6, 3)]);
    assert_eq!(split(5, 1), vec![(0, 5)]);
}

#[test]
fn test_tiles_cover_image_exactly_once() {
    let grid = GridShape::new(3, 4).unwrap();
    let tiles = grid.tiles((23, 30)).unwrap();
    assert_eq!(tiles.len(), 12);
    assert_eq!(tiles[0], Tile { row: 0, col: 0, x0: 0, y0: 0, width: 7, height: 7 });
    assert_eq!(tiles[11].shape(), (9, 9));
    assert_eq!((tiles[5].row, tiles[5].col), (1, 1));

    let mut hits = vec![0u8; 23 * 30];
    for t in &tiles {
        for y in t.y0..t.y0 + t.height {
            for x in t.x0..t.x0 + t.width {
                hits[y * 30 + x] += 1;
            }
        }
    }
    assert!(hits.iter().all(|&h| h == 1));
}

#[test]
fn test_tiles_rejects_grid_finer_than_image() {
    let grid = GridShape::new(5, 1).unwrap();
    assert!(grid.tiles((4, 10)).is_err());
}

#[test]
fn test_assemble_round_trip() {
    let image = Buffer2::from_fn(11, 7, |x, y| (y * 11 + x) as f64);
    let tiles = GridShape::new(2, 3).unwrap().tiles(image.shape()).unwrap();
    let parts: Vec<Buffer2<f64>> = tiles
        .iter()
        .map(|t| image.crop(t.x0, t.y0, t.width, t.height))
        .collect();
    let refs: Vec<&Buffer2<f64>> = parts.iter().collect();
    assert_eq!(assemble(&tiles, &refs, 11, 7), image);
}

#[test]
fn test_fit_tiles_keeps_order_and_propagates_errors() {
    let tiles = GridShape::new(2, 2).unwrap().tiles((8, 8)).unwrap();
    let ids = fit_tiles(&tiles, |t| Ok(t.row * 2 + t.col)).unwrap();
    assert_eq!(ids, vec![0, 1, 2, 3]);

    let err = fit_tiles(&tiles, |t| {
        if t.row == 1 {
            Err(Error::SingularSystem { dof: 1 })
        } else {
            Ok(())
        }
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Numeric);
}
