//! VoxelGrid tests: coordinate mapping, bounds, and extended-id storage.
//! Block values are opaque `BlockId`s.

use voxtick_engine::world::grid::EXT_MARKERS;
use voxtick_engine::world::{BlockId, BlockPos, GridError, VoxelGrid};

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn zero_dimension_is_rejected() {
    assert_eq!(
        VoxelGrid::new(0, 4, 4).err(),
        Some(GridError::ZeroDimension(0, 4, 4))
    );
}

#[test]
fn from_raw_checks_length() {
    let err = VoxelGrid::from_raw(2, 2, 2, vec![0; 7]).err();
    assert_eq!(
        err,
        Some(GridError::SizeMismatch {
            expected: 8,
            actual: 7
        })
    );
    let grid = VoxelGrid::from_raw(2, 2, 2, vec![5; 8]).unwrap();
    assert_eq!(grid.get(BlockPos::new(1, 1, 1)), BlockId(5));
}

// ---------------------------------------------------------------------------
// Coordinate mapping
// ---------------------------------------------------------------------------

#[test]
fn index_round_trips_for_every_cell() {
    let grid = VoxelGrid::new(7, 5, 3).unwrap();
    for y in 0..5 {
        for z in 0..3 {
            for x in 0..7 {
                let pos = BlockPos::new(x, y, z);
                let index = grid.pos_to_index(pos).expect("in range");
                assert_eq!(grid.index_to_pos(index), pos);
            }
        }
    }
}

#[test]
fn index_layout_is_x_then_z_then_y() {
    let grid = VoxelGrid::new(4, 3, 2).unwrap();
    assert_eq!(grid.pos_to_index(BlockPos::new(1, 0, 0)), Some(1));
    assert_eq!(grid.pos_to_index(BlockPos::new(0, 0, 1)), Some(4));
    assert_eq!(grid.pos_to_index(BlockPos::new(0, 1, 0)), Some(8));
}

#[test]
fn out_of_range_reads_are_invalid_not_panics() {
    let grid = VoxelGrid::new(4, 4, 4).unwrap();
    assert_eq!(grid.get(BlockPos::new(-1, 0, 0)), BlockId::INVALID);
    assert_eq!(grid.get(BlockPos::new(0, 4, 0)), BlockId::INVALID);
    assert!(grid.get(BlockPos::new(0, 0, 99)).is_air_like());
    assert!(grid.get_with_index(BlockPos::new(4, 0, 0)).is_none());
    assert!(grid.pos_to_index(BlockPos::new(0, -1, 0)).is_none());
}

#[test]
fn neighbor_index_stops_at_edges() {
    let grid = VoxelGrid::new(4, 4, 4).unwrap();
    let corner = grid.pos_to_index(BlockPos::new(3, 0, 0)).unwrap();
    assert!(grid.neighbor_index(corner, 1, 0, 0).is_none());
    assert!(grid.neighbor_index(corner, 0, -1, 0).is_none());
    let west = grid.neighbor_index(corner, -1, 0, 0).unwrap();
    assert_eq!(grid.index_to_pos(west), BlockPos::new(2, 0, 0));
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[test]
fn set_raw_writes_base_ids() {
    let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
    let pos = BlockPos::new(1, 2, 3);
    let index = grid.pos_to_index(pos).unwrap();
    assert!(grid.set_raw(index, BlockId(12)));
    assert_eq!(grid.get(pos), BlockId(12));
    assert_eq!(grid.get_with_index(pos), Some((BlockId(12), index)));
}

#[test]
fn marker_bytes_are_not_storable_as_base_ids() {
    let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
    for marker in EXT_MARKERS {
        assert!(!grid.set_raw(0, BlockId(marker as u16)));
    }
    assert!(!grid.set_raw(0, BlockId::INVALID));
    assert_eq!(grid.get_index(0), BlockId::AIR);
}

#[test]
fn extended_ids_use_sparse_sections() {
    let mut grid = VoxelGrid::new(40, 20, 40).unwrap();
    assert_eq!(grid.extended_section_count(), 0);

    let a = BlockPos::new(1, 1, 1);
    let b = BlockPos::new(35, 18, 35);
    assert!(grid.set(a, BlockId(300)));
    assert!(grid.set(b, BlockId(1023)));
    assert_eq!(grid.get(a), BlockId(300));
    assert_eq!(grid.get(b), BlockId(1023));
    assert_eq!(grid.extended_section_count(), 2);

    // Overwriting with a base id frees the section once it is empty.
    assert!(grid.set(a, BlockId(1)));
    assert_eq!(grid.get(a), BlockId(1));
    assert_eq!(grid.extended_section_count(), 1);
}

#[test]
fn fill_clamps_to_the_grid() {
    let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
    grid.fill(BlockPos::new(-5, 0, -5), BlockPos::new(10, 0, 10), BlockId(7));
    assert!(grid.raw_blocks()[..16].iter().all(|b| *b == 7));
    assert!(grid.raw_blocks()[16..].iter().all(|b| *b == 0));
}
