use mpi::traits::*;

use super::decomp::{Direction, TileInfo};
use super::tile::{TileStore, SYNCED_FIELDS};

// Strided view of one tile column: num_y cells starting at y = start_y.
// Stands in for an MPI subarray datatype; payloads are packed to a
// contiguous scratch buffer around each send/receive.
#[derive(Debug, Clone, Copy)]
struct ColumnView {
    offset: usize,
    stride: usize,
    count: usize,
}

impl ColumnView {
    fn new(tile: &TileInfo, x: usize) -> Self {
        Self {
            offset: tile.start_y * tile.dim_x + x,
            stride: tile.dim_x,
            count: tile.num_y,
        }
    }

    fn pack(&self, src: &[f64], buf: &mut [f64]) {
        for (i, slot) in buf[..self.count].iter_mut().enumerate() {
            *slot = src[self.offset + i * self.stride];
        }
    }

    fn unpack(&self, buf: &[f64], dst: &mut [f64]) {
        for (i, value) in buf[..self.count].iter().enumerate() {
            dst[self.offset + i * self.stride] = *value;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Region {
    Contiguous { offset: usize, len: usize },
    Strided(ColumnView),
}

impl Region {
    fn cell(offset: usize) -> Self {
        Region::Contiguous { offset, len: 1 }
    }

    fn len(&self) -> usize {
        match self {
            Region::Contiguous { len, .. } => *len,
            Region::Strided(view) => view.count,
        }
    }

    fn pack(&self, src: &[f64], buf: &mut [f64]) {
        match *self {
            Region::Contiguous { offset, len } => {
                buf[..len].copy_from_slice(&src[offset..offset + len]);
            }
            Region::Strided(view) => view.pack(src, buf),
        }
    }

    fn unpack(&self, buf: &[f64], dst: &mut [f64]) {
        match *self {
            Region::Contiguous { offset, len } => {
                dst[offset..offset + len].copy_from_slice(&buf[..len]);
            }
            Region::Strided(view) => view.unpack(buf, dst),
        }
    }
}

// Send region is an owned edge, receive region the matching own ghost.
#[derive(Debug, Clone, Copy)]
struct ExchangePlan {
    send: Region,
    recv: Region,
}

pub struct HaloExchange {
    plan: [ExchangePlan; 8],
    send_buf: Vec<f64>,
    recv_buf: Vec<f64>,
}

impl HaloExchange {
    pub fn new(tile: &TileInfo) -> Self {
        let dim_x = tile.dim_x;
        let dim_y = tile.dim_y;
        let start_x = tile.start_x;
        let start_y = tile.start_y;
        let num_x = tile.num_x;

        let left_boundary_col = ColumnView::new(tile, 0);
        let left_col = ColumnView::new(tile, start_x);
        let right_col = ColumnView::new(tile, start_x + num_x - 1);
        let right_boundary_col = ColumnView::new(tile, dim_x - 1);

        // Offsets into rows that only exist when the neighbor exists; the
        // saturation keeps construction total for edge tiles.
        let north_send_row = dim_y.saturating_sub(2) * dim_x;
        let north_recv_row = dim_y.saturating_sub(1) * dim_x;
        let east_send_x = dim_x.saturating_sub(2);
        let east_recv_x = dim_x.saturating_sub(1);

        let plan = [
            // N
            ExchangePlan {
                send: Region::Contiguous {
                    offset: north_send_row + start_x,
                    len: num_x,
                },
                recv: Region::Contiguous {
                    offset: north_recv_row + start_x,
                    len: num_x,
                },
            },
            // E
            ExchangePlan {
                send: Region::Strided(right_col),
                recv: Region::Strided(right_boundary_col),
            },
            // S
            ExchangePlan {
                send: Region::Contiguous {
                    offset: start_y * dim_x + start_x,
                    len: num_x,
                },
                recv: Region::Contiguous {
                    offset: start_x,
                    len: num_x,
                },
            },
            // W
            ExchangePlan {
                send: Region::Strided(left_col),
                recv: Region::Strided(left_boundary_col),
            },
            // NE
            ExchangePlan {
                send: Region::cell(north_send_row + east_send_x),
                recv: Region::cell(north_recv_row + east_recv_x),
            },
            // NW
            ExchangePlan {
                send: Region::cell(north_send_row + start_x),
                recv: Region::cell(north_recv_row),
            },
            // SE
            ExchangePlan {
                send: Region::cell(start_y * dim_x + east_send_x),
                recv: Region::cell(east_recv_x),
            },
            // SW
            ExchangePlan {
                send: Region::cell(start_y * dim_x + start_x),
                recv: Region::cell(0),
            },
        ];

        let scratch = tile.num_x.max(tile.num_y);
        Self {
            plan,
            send_buf: vec![0.0; scratch],
            recv_buf: vec![0.0; scratch],
        }
    }

    // One full boundary synchronization: for every existing neighbor, in the
    // fixed phase order, each synced field is packed, exchanged with a
    // paired send/receive, and unpacked into the ghost region. Phase `d`
    // sends with tag opposite(d) and receives with tag d, so the pairing
    // matches the peer's opposite phase.
    pub fn exchange<C: Communicator>(
        &mut self,
        comm: &C,
        neighbors: &[Option<usize>; 8],
        store: &mut TileStore,
    ) {
        for dir in Direction::ALL {
            let Some(peer) = neighbors[dir.index()] else {
                continue;
            };
            let peer = peer as i32;
            let plan = self.plan[dir.index()];
            let len = plan.send.len();
            let send_tag = dir.opposite().tag();
            let recv_tag = dir.tag();
            for field in SYNCED_FIELDS {
                plan.send.pack(store.field(field), &mut self.send_buf);
                paired_exchange(
                    comm,
                    peer,
                    &self.send_buf[..len],
                    send_tag,
                    &mut self.recv_buf[..len],
                    recv_tag,
                );
                plan.recv.unpack(&self.recv_buf, store.field_mut(field));
            }
        }
    }
}

// Both sides of a pairing post the receive before the send, so matching
// phases cannot deadlock regardless of rank order (including self sends).
pub(crate) fn paired_exchange<T, C>(
    comm: &C,
    peer: i32,
    send: &[T],
    send_tag: i32,
    recv: &mut [T],
    recv_tag: i32,
) where
    T: Equivalence,
    C: Communicator,
{
    let process = comm.process_at_rank(peer);
    mpi::request::scope(|scope| {
        let recv_req = process.immediate_receive_into_with_tag(scope, recv, recv_tag);
        let send_req = process.immediate_send_with_tag(scope, send, send_tag);
        send_req.wait();
        recv_req.wait();
    });
}
