use super::*;
use crate::order::OrderInstance;
use crate::tour::{Tour, TourLeg};
use crate::types::*;
use crate::utils::Matrix2;

#[cfg(test)]
mod tests {
    use super::*;

    /// Vertices `0..n` chained left to right with unit edges.
    fn line_graph(n: usize) -> RouteGraph {
        let mut graph = RouteGraph::new();
        for i in 0..n {
            graph.add_vertex(Coord::new(i as u16, 0), VertexKind::Plain);
        }
        for i in 1..n {
            graph.add_edge(i as VertexId - 1, i as VertexId, 1);
        }
        graph
    }

    fn order(
        id: OrderId,
        start: VertexId,
        target: VertexId,
        picks: &[(VertexId, ClassId, Time)],
    ) -> OrderInstance {
        OrderInstance::new(id, start, target, picks.iter().copied()).unwrap()
    }

    fn plan(
        graph: &RouteGraph,
        from: VertexId,
        to: VertexId,
        dwell: Time,
        at: Time,
        table: Option<&ReservationTable>,
        dir: SearchDir,
    ) -> Option<PlannedRoute> {
        let mut scratch = SearchScratch::new(graph.vertex_count());
        graph
            .shortest_route(&mut scratch, from, to, dwell, at, table, dir, true)
            .unwrap()
    }

    /// A real move may never bounce straight back to the vertex it departed,
    /// waits in between included.
    fn assert_no_reversals(path: &[VertexId]) {
        let mut departed = None;
        for pair in path.windows(2) {
            if pair[0] != pair[1] {
                assert_ne!(Some(pair[1]), departed, "path reverses a move: {:?}", path);
                departed = Some(pair[0]);
            }
        }
    }

    fn assert_clear(table: &ReservationTable, path: &[VertexId], anchor: Time) {
        for (step, &vertex) in path.iter().enumerate() {
            assert!(
                !table.is_reserved(anchor + step as Time, vertex),
                "path occupies reserved ({}, {})",
                anchor + step as Time,
                vertex
            );
        }
    }

    #[test]
    fn distances_are_symmetric_and_match_cached_paths() {
        let mut graph = line_graph(5);
        let orders = [order(0, 0, 4, &[(1, 1, 1), (3, 2, 1)])];
        graph.initialize(&orders).unwrap();

        let used: [VertexId; 4] = [0, 4, 1, 3];
        for &u in &used {
            for &v in &used {
                assert_eq!(graph.distance(u, v), graph.distance(v, u));
                assert_eq!(graph.distance(u, v), (u as Time - v as Time).abs());
                if u != v {
                    let path = graph.cached_route(u, v).unwrap();
                    assert_eq!(path.len() as Time, graph.distance(u, v) + 1);
                    assert_eq!(path.first(), Some(&u));
                    assert_eq!(path.last(), Some(&v));
                    let mut reversed = path.to_vec();
                    reversed.reverse();
                    assert_eq!(graph.cached_route(v, u).unwrap(), &reversed[..]);
                }
            }
        }
    }

    #[test]
    fn priming_order_never_skews_the_distances() {
        // Iteration over the used set has no fixed order; every rebuild must
        // land on the same exact distances.
        for _ in 0..64 {
            let mut graph = line_graph(5);
            let orders = [order(0, 0, 4, &[(1, 1, 1), (3, 2, 1)])];
            graph.initialize(&orders).unwrap();

            let used: [VertexId; 4] = [0, 4, 1, 3];
            for &u in &used {
                for &v in &used {
                    assert_eq!(
                        graph.distance(u, v),
                        (u as Time - v as Time).abs(),
                        "distance({u}, {v}) corrupted by a rebuild"
                    );
                }
            }
        }
    }

    #[test]
    fn fast_path_returns_the_cached_route_untouched() {
        let mut graph = line_graph(5);
        let orders = [order(0, 0, 4, &[(1, 1, 1), (3, 2, 1)])];
        graph.initialize(&orders).unwrap();
        let cached = graph.cached_route(0, 3).unwrap().to_vec();

        let unconstrained = plan(&graph, 0, 3, 2, 5, None, SearchDir::Forward).unwrap();
        assert_eq!(unconstrained.time, 5);
        assert_eq!(unconstrained.path.as_deref(), Some(&cached[..]));

        // A reservation inside the window but off the path changes nothing.
        let table: ReservationTable = [(6 as Time, 4 as VertexId), (8, 0)].into_iter().collect();
        let skimmed = plan(&graph, 0, 3, 2, 5, Some(&table), SearchDir::Forward).unwrap();
        assert_eq!(skimmed.time, 5);
        assert_eq!(skimmed.path.as_deref(), Some(&cached[..]));
    }

    #[test]
    fn reservation_on_the_cached_path_forces_a_detour() {
        // Unit square: two equally short ways around.
        let mut graph = RouteGraph::new();
        graph.add_vertex(Coord::new(0, 0), VertexKind::Plain);
        graph.add_vertex(Coord::new(1, 0), VertexKind::Plain);
        graph.add_vertex(Coord::new(1, 1), VertexKind::Plain);
        graph.add_vertex(Coord::new(0, 1), VertexKind::Plain);
        graph.add_edge(0, 1, 1);
        graph.add_edge(1, 2, 1);
        graph.add_edge(0, 3, 1);
        graph.add_edge(3, 2, 1);
        let orders = [order(0, 0, 2, &[(1, 1, 1)])];
        graph.initialize(&orders).unwrap();

        let cached = graph.cached_route(0, 2).unwrap().to_vec();
        let mid = cached[1];
        let other = if mid == 1 { 3 } else { 1 };

        let table: ReservationTable = [(1 as Time, mid)].into_iter().collect();
        let detour = plan(&graph, 0, 2, 0, 0, Some(&table), SearchDir::Forward).unwrap();
        assert_eq!(detour.time, 2);
        let path = detour.path.unwrap();
        assert_eq!(path, vec![0, other, 2]);
        assert_clear(&table, &path, 0);
    }

    #[test]
    fn origin_reserved_during_dwell_cancels_the_leg() {
        let mut graph = line_graph(5);
        let orders = [order(0, 0, 4, &[(1, 1, 1), (3, 2, 1)])];
        graph.initialize(&orders).unwrap();

        // Pinned at vertex 1 over times 10..=12; either hit is fatal for the leg.
        let at_arrival: ReservationTable = [(10 as Time, 1 as VertexId)].into_iter().collect();
        assert!(plan(&graph, 1, 3, 2, 10, Some(&at_arrival), SearchDir::Forward).is_none());
        let mid_dwell: ReservationTable = [(12 as Time, 1 as VertexId)].into_iter().collect();
        assert!(plan(&graph, 1, 3, 2, 10, Some(&mid_dwell), SearchDir::Forward).is_none());
    }

    #[test]
    fn waiting_in_place_lets_a_reservation_expire() {
        let mut graph = line_graph(5);
        let orders = [order(0, 0, 4, &[(2, 1, 1)])];
        graph.initialize(&orders).unwrap();

        // The corridor leaves no detour; one wait is the only escape.
        let table: ReservationTable = [(2 as Time, 2 as VertexId)].into_iter().collect();
        let waited = plan(&graph, 0, 4, 0, 0, Some(&table), SearchDir::Forward).unwrap();
        assert_eq!(waited.time, 5);
        let path = waited.path.unwrap();
        assert_eq!(path.len(), 6);
        assert!(path.windows(2).any(|w| w[0] == w[1]), "no wait in {:?}", path);
        assert_clear(&table, &path, 0);
        assert_no_reversals(&path);
    }

    #[test]
    fn reverse_queries_anchor_the_arrival_time() {
        let mut graph = line_graph(5);
        let orders = [order(0, 0, 4, &[(1, 1, 1), (3, 2, 1)])];
        graph.initialize(&orders).unwrap();

        let table: ReservationTable = [(9 as Time, 2 as VertexId)].into_iter().collect();
        let planned = plan(&graph, 1, 3, 0, 10, Some(&table), SearchDir::Reverse).unwrap();
        assert_eq!(planned.time, 3);
        // Wait once at the arrival vertex, landing exactly at time 10.
        assert_eq!(planned.path.unwrap(), vec![1, 2, 3, 3]);

        // A window reaching before time zero skips verification entirely.
        let early: ReservationTable = [(0 as Time, 2 as VertexId)].into_iter().collect();
        let cached = plan(&graph, 1, 3, 0, 1, Some(&early), SearchDir::Reverse).unwrap();
        assert_eq!(cached.time, 2);
        assert_eq!(cached.path.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn self_route_carries_the_dwell_alone() {
        let mut graph = line_graph(5);
        // Two classes stocked at the same vertex prime the (2, 2) pair.
        let orders = [order(0, 0, 4, &[(2, 1, 1), (2, 2, 1)])];
        graph.initialize(&orders).unwrap();

        let dwelled = plan(&graph, 2, 2, 3, 7, None, SearchDir::Forward).unwrap();
        assert_eq!(dwelled.time, 3);
        assert_eq!(dwelled.path.unwrap(), vec![2]);
        assert!(plan(&graph, 2, 2, 0, 7, None, SearchDir::Forward).is_none());
    }

    #[test]
    fn route_cache_covers_only_pairs_within_one_order() {
        let mut graph = line_graph(5);
        let orders = [
            order(0, 0, 1, &[(1, 1, 1)]),
            order(1, 3, 4, &[(3, 1, 1)]),
        ];
        graph.initialize(&orders).unwrap();

        assert!(graph.cached_route(0, 1).is_some());
        assert!(graph.cached_route(3, 4).is_some());
        // Distances of used vertices are global, routes are per order.
        assert_eq!(graph.distance(0, 4), 4);
        assert!(graph.cached_route(0, 4).is_none());
    }

    #[test]
    fn non_unit_edge_costs_travel_in_unit_steps() {
        let mut graph = line_graph(3);
        graph.add_vertex(Coord::new(3, 0), VertexKind::Plain);
        graph.add_edge(2, 3, 5);
        let orders = [order(0, 0, 3, &[(1, 1, 1)])];
        graph.initialize(&orders).unwrap();

        assert_eq!(graph.edges.last().unwrap().cost, 5);
        assert_eq!(graph.distance(0, 3), 3);
        let planned = plan(&graph, 0, 3, 0, 0, None, SearchDir::Forward).unwrap();
        assert_eq!(planned.time, 3);
        assert_eq!(planned.path.unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn disconnected_order_endpoints_are_fatal() {
        let mut graph = RouteGraph::new();
        for i in 0..4 {
            graph.add_vertex(Coord::new(i, 0), VertexKind::Plain);
        }
        graph.add_edge(0, 1, 1);
        graph.add_edge(2, 3, 1);

        let orders = [order(0, 0, 3, &[(1, 1, 1)])];
        let err = graph.initialize(&orders).unwrap_err();
        assert_eq!(err, SearchError::Exhausted { from: 0, to: 3 });
    }

    #[test]
    fn grid_layout_builds_storage_access_vertices() {
        // Middle column racked, bottom-left cell staging.
        let mut grid = Matrix2::new(3, 3, Cell::Floor);
        for row in 0..3 {
            *grid.get_mut(row, 1) = Cell::Rack(vec![10, 11]);
        }
        *grid.get_mut(2, 0) = Cell::Staging;
        let warehouse = Warehouse::from_grid(&grid);

        assert_eq!(warehouse.graph.vertex_count(), 6);
        assert_eq!(warehouse.vertex_at(Coord::new(1, 0)), None);
        assert_eq!(warehouse.vertex_at(Coord::new(0, 1)), Some(2));
        assert_eq!(warehouse.staging(), &[4][..]);

        match &warehouse.graph.vertex(0).kind {
            VertexKind::Storage { left, right } => {
                assert!(left.is_none());
                assert_eq!(right.as_ref().unwrap().items, vec![10, 11]);
            }
            kind => panic!("expected storage access vertex, got {:?}", kind),
        }

        let ground = warehouse.slots_for_item(10);
        assert_eq!(ground.len(), 5);
        assert!(ground.iter().all(|slot| slot.level == 0));
        assert_eq!(ground[0].vertex, 0);
        assert_eq!(ground[0].side, ShelfSide::Right);
        let raised = warehouse.slots_for_item(11);
        assert_eq!(raised.len(), 5);
        assert!(raised.iter().all(|slot| slot.level == 1));
        assert!(warehouse.slots_for_item(99).is_empty());
    }

    #[test]
    fn pick_times_follow_the_shelf_formula() {
        assert_eq!(pick_duration(0), 120);
        assert_eq!(pick_duration(1), 124);
        assert_eq!(pick_duration(2), 128);
        // Securing the picker starts at the third level.
        assert_eq!(pick_duration(3), 252);
        assert_eq!(pick_duration(4), 256);
    }

    #[test]
    fn commit_tour_reserves_every_occupied_step() {
        let tour = Tour::from_legs(
            5,
            vec![
                TourLeg {
                    from: 0,
                    to: 1,
                    dwell: 0,
                    path: vec![0, 1],
                },
                TourLeg {
                    from: 1,
                    to: 2,
                    dwell: 1,
                    path: vec![1, 2],
                },
            ],
        );
        let mut table = ReservationTable::new();
        table.commit_tour(&tour);

        assert_eq!(table.len() as Time, tour.length());
        for (step, vertex) in tour.steps().enumerate() {
            assert!(table.is_reserved(5 + step as Time, vertex));
        }
        assert!(!table.is_reserved(4, 0));
        assert!(!table.is_reserved(9, 2));
    }

    #[test]
    fn reservation_window_is_ascending_and_inclusive() {
        let table: ReservationTable = [(5 as Time, 1 as VertexId), (1, 2), (3, 3), (3, 4)]
            .into_iter()
            .collect();
        let window: Vec<(Time, Vec<VertexId>)> = table
            .window(1, 3)
            .map(|(t, vs)| (t, vs.to_vec()))
            .collect();
        assert_eq!(window, vec![(1, vec![2]), (3, vec![3, 4])]);
        assert!(table.window(4, 4).next().is_none());
        assert_eq!(table.len(), 4);
        assert!(!table.is_empty());
    }
}
