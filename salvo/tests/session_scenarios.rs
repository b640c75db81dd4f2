// Copyright 2020 Zachary Stewart
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::time::Instant;

use salvo::{
    board::{BoardDimensions, Coordinate, FleetSetup, PlacedShip},
    game::{ConnectionId, SeatLabel, Session, SessionId, SessionStatus, TimerCommand, TimerTicket},
    protocol::{ErrorCode, ServerEvent, ShotReport},
    ships::{Orientation, ShipKind},
    SessionConfig, SessionError, Transition,
};

const P1: ConnectionId = ConnectionId::new(1);
const P2: ConnectionId = ConnectionId::new(2);

/// A cell neither standard fleet covers.
const OPEN_WATER: Coordinate = Coordinate { row: 9, col: 9 };

fn standard_fleet() -> Vec<PlacedShip> {
    let mut setup = FleetSetup::new(BoardDimensions::default());
    let layout = [
        (ShipKind::Carrier, 0, 0),
        (ShipKind::Cruiser, 0, 5),
        (ShipKind::Destroyer, 2, 0),
        (ShipKind::Frigate, 3, 0),
        (ShipKind::Submarine, 4, 0),
        (ShipKind::Corvette, 6, 0),
    ];
    for &(kind, row, col) in &layout {
        setup
            .place(kind, Coordinate::new(row, col), Orientation::Horizontal)
            .unwrap();
    }
    assert!(setup.ready());
    setup.ships().to_vec()
}

fn new_session(config: SessionConfig) -> Session {
    Session::new(SessionId::new("SCENE01"), config, Instant::now())
}

fn started_ticket(transition: &Transition) -> TimerTicket {
    match transition.timer {
        TimerCommand::Start(ticket) => ticket,
        other => panic!("expected the timer to start, got {:?}", other),
    }
}

/// Two seats joined, fleets placed and both ready. Returns the ticket armed at game
/// start.
fn playing_session() -> (Session, TimerTicket) {
    let mut session = new_session(SessionConfig::default());
    session.join(P1, Some("Alice".into())).unwrap();
    session.join(P2, Some("Bob".into())).unwrap();
    session.submit_placement(P1, standard_fleet()).unwrap();
    session.submit_placement(P2, standard_fleet()).unwrap();
    session.set_ready(P1).unwrap();
    let start = session.set_ready(P2).unwrap();
    let ticket = started_ticket(&start);
    (session, ticket)
}

fn enemy_cells(session: &Session, defender: SeatLabel) -> Vec<Coordinate> {
    session
        .seat(defender)
        .unwrap()
        .fleet()
        .iter_ships()
        .flat_map(|ship| ship.coords().collect::<Vec<_>>())
        .collect()
}

#[test]
fn joins_fill_seats_in_order() {
    let mut session = new_session(SessionConfig::default());

    let (seat, first) = session.join(P1, None).unwrap();
    assert_eq!(seat, SeatLabel::A);
    assert_eq!(session.status(), SessionStatus::Waiting);
    assert_eq!(
        first.events_for(SeatLabel::A).collect::<Vec<_>>(),
        vec![&ServerEvent::JoinedSession {
            seat: SeatLabel::A,
            session_id: SessionId::new("SCENE01"),
            seat_count: 1,
        }]
    );
    assert_eq!(first.events_for(SeatLabel::B).count(), 0);

    let (seat, second) = session.join(P2, None).unwrap();
    assert_eq!(seat, SeatLabel::B);
    assert_eq!(session.status(), SessionStatus::Setup);
    assert_eq!(
        second.events_for(SeatLabel::A).collect::<Vec<_>>(),
        vec![&ServerEvent::SeatJoined {
            seat: SeatLabel::B,
            seat_count: 2,
        }]
    );

    let err = session.join(ConnectionId::new(3), None).unwrap_err();
    assert_eq!(err, SessionError::SessionFull);
    assert_eq!(err.code(), ErrorCode::SessionFull);
}

#[test]
fn ready_handshake_starts_play_with_seat_a() {
    let mut session = new_session(SessionConfig::default());
    session.join(P1, None).unwrap();
    session.join(P2, None).unwrap();

    let ack = session.submit_placement(P1, standard_fleet()).unwrap();
    assert_eq!(
        ack.events_for(SeatLabel::A).collect::<Vec<_>>(),
        vec![&ServerEvent::PlacementAccepted { ship_count: 6 }]
    );
    session.submit_placement(P2, standard_fleet()).unwrap();

    let first = session.set_ready(P2).unwrap();
    assert_eq!(session.status(), SessionStatus::Setup);
    assert_eq!(
        first.events_for(SeatLabel::A).collect::<Vec<_>>(),
        vec![&ServerEvent::OpponentReady]
    );
    assert_eq!(first.events_for(SeatLabel::B).count(), 0);
    assert_eq!(first.timer, TimerCommand::Keep);

    let start = session.set_ready(P1).unwrap();
    assert_eq!(session.status(), SessionStatus::Playing);
    assert_eq!(session.current_turn(), Some(SeatLabel::A));
    let game_start = ServerEvent::GameStart {
        current_turn: SeatLabel::A,
    };
    for seat in SeatLabel::ALL.iter().copied() {
        assert_eq!(start.events_for(seat).collect::<Vec<_>>(), vec![&game_start]);
    }
    started_ticket(&start);

    // A repeated ready does not restart the game.
    assert!(session.set_ready(P1).unwrap().is_empty());
}

#[test]
fn sinking_the_smallest_ship_reports_it() {
    let (mut session, _) = playing_session();
    let corvette = [(6, 0), (6, 1), (6, 2)];

    for (i, &(row, col)) in corvette.iter().enumerate() {
        let transition = session.fire_shot(P1, Coordinate::new(row, col)).unwrap();
        let sunk = if i == corvette.len() - 1 {
            Some(ShipKind::Corvette)
        } else {
            None
        };
        assert_eq!(
            transition.events_for(SeatLabel::A).collect::<Vec<_>>(),
            vec![&ServerEvent::ShotResult(ShotReport {
                row,
                col,
                hit: true,
                sunk_ship: sunk,
                your_turn: false,
            })]
        );
        assert_eq!(
            transition.events_for(SeatLabel::B).collect::<Vec<_>>(),
            vec![&ServerEvent::OpponentShot(ShotReport {
                row,
                col,
                hit: true,
                sunk_ship: sunk,
                your_turn: true,
            })]
        );
        session.fire_shot(P2, OPEN_WATER).unwrap();
    }
    assert_eq!(session.status(), SessionStatus::Playing);
}

#[test]
fn last_cell_ends_the_game_without_turn_switch() {
    let (mut session, _) = playing_session();
    let targets = enemy_cells(&session, SeatLabel::B);
    let (last, rest) = targets.split_last().unwrap();

    for &target in rest {
        session.fire_shot(P1, target).unwrap();
        assert_eq!(session.status(), SessionStatus::Playing);
        session.fire_shot(P2, OPEN_WATER).unwrap();
    }
    // One cell left afloat is not a win.
    assert_eq!(session.winner(), None);

    let transition = session.fire_shot(P1, *last).unwrap();
    assert_eq!(session.status(), SessionStatus::Finished);
    assert_eq!(session.winner(), Some(SeatLabel::A));
    assert_eq!(transition.timer, TimerCommand::Cancel);
    let game_over = ServerEvent::GameOver {
        winner: SeatLabel::A,
        winner_name: "Alice".into(),
    };
    for seat in SeatLabel::ALL.iter().copied() {
        assert_eq!(transition.events_for(seat).collect::<Vec<_>>(), vec![&game_over]);
    }

    let stats = session.seat(SeatLabel::A).unwrap().stats();
    assert_eq!(stats.total_shots, 32);
    assert_eq!(stats.hits, 32);
    assert_eq!(stats.accuracy, 100);

    // Finished is terminal.
    assert_eq!(
        session.fire_shot(P2, Coordinate::new(0, 0)).unwrap_err(),
        SessionError::NotPlaying
    );
    assert!(session.skip_turn(P2).is_empty());
}

#[test]
fn out_of_turn_shot_changes_nothing() {
    let (mut session, _) = playing_session();
    let err = session.fire_shot(P2, Coordinate::new(0, 0)).unwrap_err();
    assert_eq!(err, SessionError::NotYourTurn);
    assert_eq!(err.code(), ErrorCode::NotYourTurn);

    assert_eq!(session.current_turn(), Some(SeatLabel::A));
    assert!(session.seat(SeatLabel::B).unwrap().shots().is_empty());
    let defender = session.seat(SeatLabel::A).unwrap();
    assert!(defender
        .fleet()
        .iter_ships()
        .all(|ship| ship.hits().all(|(_, hit)| !hit)));
}

#[test]
fn shots_before_play_are_refused() {
    let mut session = new_session(SessionConfig::default());
    session.join(P1, None).unwrap();
    session.join(P2, None).unwrap();
    assert_eq!(
        session.fire_shot(P1, Coordinate::new(0, 0)).unwrap_err(),
        SessionError::NotPlaying
    );
}

#[test]
fn exactly_one_side_moves_next() {
    let (mut session, _) = playing_session();
    let targets = [
        (P1, Coordinate::new(0, 0)),
        (P2, OPEN_WATER),
        (P1, Coordinate::new(8, 8)),
        (P2, Coordinate::new(6, 1)),
    ];
    for &(conn, target) in &targets {
        let transition = session.fire_shot(conn, target).unwrap();
        let granted: Vec<SeatLabel> = transition
            .deliveries
            .iter()
            .filter_map(|delivery| match delivery.event {
                ServerEvent::ShotResult(report) | ServerEvent::OpponentShot(report)
                    if report.your_turn =>
                {
                    Some(delivery.seat)
                }
                _ => None,
            })
            .collect();
        assert_eq!(transition.deliveries.len(), 2);
        assert_eq!(granted.len(), 1);
        assert_eq!(session.current_turn(), Some(granted[0]));
        started_ticket(&transition);
    }
}

#[test]
fn repeat_shot_consumes_the_turn() {
    let (mut session, _) = playing_session();
    let target = Coordinate::new(0, 0);
    session.fire_shot(P1, target).unwrap();
    session.fire_shot(P2, OPEN_WATER).unwrap();

    let transition = session.fire_shot(P1, target).unwrap();
    assert_eq!(session.current_turn(), Some(SeatLabel::B));
    match transition.events_for(SeatLabel::A).next() {
        Some(ServerEvent::ShotResult(report)) => {
            assert!(report.hit);
            assert_eq!(report.sunk_ship, None);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(session.seat(SeatLabel::A).unwrap().shots().len(), 2);
}

#[test]
fn timer_expiry_skips_the_idle_seat() {
    let (mut session, ticket) = playing_session();

    let transition = session.expire_turn(ticket);
    assert_eq!(session.current_turn(), Some(SeatLabel::B));
    assert_eq!(
        transition.events_for(SeatLabel::A).collect::<Vec<_>>(),
        vec![&ServerEvent::TurnSkipped { your_turn: false }]
    );
    assert_eq!(
        transition.events_for(SeatLabel::B).collect::<Vec<_>>(),
        vec![&ServerEvent::OpponentSkipped { your_turn: true }]
    );
    assert!(session.seat(SeatLabel::A).unwrap().shots().is_empty());

    // The skip arms a fresh countdown for seat B.
    let next = started_ticket(&transition);
    assert_ne!(next, ticket);
    session.expire_turn(next);
    assert_eq!(session.current_turn(), Some(SeatLabel::A));
}

#[test]
fn superseded_ticket_is_ignored() {
    let (mut session, ticket) = playing_session();
    session.fire_shot(P1, OPEN_WATER).unwrap();

    assert!(session.expire_turn(ticket).is_empty());
    assert_eq!(session.current_turn(), Some(SeatLabel::B));
}

#[test]
fn skip_is_ignored_unless_it_is_your_turn() {
    let (mut session, _) = playing_session();
    assert!(session.skip_turn(P2).is_empty());
    assert_eq!(session.current_turn(), Some(SeatLabel::A));

    let transition = session.skip_turn(P1);
    assert_eq!(session.current_turn(), Some(SeatLabel::B));
    assert_eq!(transition.deliveries.len(), 2);

    let mut setup = new_session(SessionConfig::default());
    setup.join(P1, None).unwrap();
    setup.join(P2, None).unwrap();
    assert!(setup.skip_turn(P1).is_empty());
    assert_eq!(setup.current_turn(), None);
}

#[test]
fn disconnect_keeps_the_game_running() {
    let (mut session, ticket) = playing_session();
    let transition = session.disconnect(P2);
    assert_eq!(transition.timer, TimerCommand::Keep);
    assert_eq!(session.status(), SessionStatus::Playing);

    // The absent seat's turns are skipped by the timer.
    session.fire_shot(P1, OPEN_WATER).unwrap();
    assert!(session.expire_turn(ticket).is_empty());
    assert_eq!(session.current_turn(), Some(SeatLabel::B));

    let last = session.disconnect(P1);
    assert_eq!(last.timer, TimerCommand::Cancel);
    assert_eq!(session.winner(), None);
}

#[test]
fn validated_sessions_reject_illegal_fleets() {
    let mut session = new_session(SessionConfig {
        validate_placements: true,
        ..SessionConfig::default()
    });
    session.join(P1, None).unwrap();

    let mut ships = standard_fleet();
    ships[1] = ships[0].clone();
    ships[1].kind = ShipKind::Cruiser;
    let err = session.submit_placement(P1, ships).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidPlacement);
    assert!(session.seat(SeatLabel::A).unwrap().fleet().is_empty());

    session.submit_placement(P1, standard_fleet()).unwrap();
    assert_eq!(session.seat(SeatLabel::A).unwrap().fleet().len(), 6);
}

#[test]
fn seat_without_a_fleet_is_never_defeated() {
    let mut session = new_session(SessionConfig::default());
    session.join(P1, None).unwrap();
    session.join(P2, None).unwrap();
    session.submit_placement(P1, standard_fleet()).unwrap();
    session.set_ready(P1).unwrap();
    session.set_ready(P2).unwrap();
    assert_eq!(session.status(), SessionStatus::Playing);

    let transition = session.fire_shot(P1, OPEN_WATER).unwrap();
    assert_eq!(session.status(), SessionStatus::Playing);
    assert_eq!(session.winner(), None);
    assert_eq!(session.current_turn(), Some(SeatLabel::B));
    assert_eq!(
        transition.events_for(SeatLabel::A).collect::<Vec<_>>(),
        vec![&ServerEvent::ShotResult(ShotReport {
            row: OPEN_WATER.row,
            col: OPEN_WATER.col,
            hit: false,
            sunk_ship: None,
            your_turn: false,
        })]
    );
}

#[test]
fn validated_fleet_starts_intact_and_is_locked_in_play() {
    let mut session = new_session(SessionConfig {
        validate_placements: true,
        ..SessionConfig::default()
    });
    session.join(P1, None).unwrap();
    session.join(P2, None).unwrap();

    let mut damaged = standard_fleet();
    for cell in damaged.iter_mut().flat_map(|ship| ship.cells.iter_mut()) {
        cell.hit = true;
    }
    session.submit_placement(P1, standard_fleet()).unwrap();
    session.submit_placement(P2, damaged).unwrap();
    assert!(session
        .seat(SeatLabel::B)
        .unwrap()
        .fleet()
        .iter_ships()
        .flat_map(|ship| ship.hits())
        .all(|(_, hit)| !hit));

    session.set_ready(P1).unwrap();
    session.set_ready(P2).unwrap();
    session.fire_shot(P1, Coordinate::new(-5, -5)).unwrap();
    assert_eq!(session.status(), SessionStatus::Playing);
    assert_eq!(session.winner(), None);

    session.fire_shot(P2, OPEN_WATER).unwrap();
    session.fire_shot(P1, Coordinate::new(0, 0)).unwrap();
    let err = session.submit_placement(P2, standard_fleet()).unwrap_err();
    assert_eq!(err, SessionError::PlacementLocked);
    assert_eq!(err.code(), ErrorCode::InvalidPlacement);
    let carrier = session
        .seat(SeatLabel::B)
        .unwrap()
        .fleet()
        .get_ship(ShipKind::Carrier)
        .unwrap();
    assert!(carrier.hits().any(|(coord, hit)| coord == Coordinate::new(0, 0) && hit));
}
