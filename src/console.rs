use std::time::Instant;

use serde::{Serialize, Serializer};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::engine::{Engine, EngineError, ErrorKind};
use crate::model::*;
use crate::observability;
use crate::sql::{self, Command, SqlError};

/// Outcome class of a command, reported with HTTP-style codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    NoContent,
    BadRequest,
    NotFound,
    Conflict,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::NoContent => 204,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::Conflict => 409,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Status::Ok | Status::Created | Status::NoContent => "ok",
            Status::BadRequest => "bad_request",
            Status::NotFound => "not_found",
            Status::Conflict => "conflict",
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Car(Car),
    Cars(Vec<Car>),
    Reservation(Reservation),
    Reservations(Vec<Reservation>),
}

/// One line of output per command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl Response {
    fn ok(status: Status, body: Option<Body>) -> Self {
        Self {
            status,
            message: None,
            field: None,
            body,
        }
    }

    fn error(status: Status, message: impl Into<String>, field: Option<&'static str>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            field,
            body: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.code() < 300
    }
}

impl From<EngineError> for Response {
    fn from(e: EngineError) -> Self {
        let status = match e.kind() {
            ErrorKind::Validation => Status::BadRequest,
            ErrorKind::NotFound => Status::NotFound,
            ErrorKind::Conflict => Status::Conflict,
        };
        let field = match &e {
            EngineError::Validation(v) => Some(v.field()),
            _ => None,
        };
        Response::error(status, e.to_string(), field)
    }
}

impl From<SqlError> for Response {
    fn from(e: SqlError) -> Self {
        Response::error(Status::BadRequest, e.to_string(), e.field())
    }
}

/// Parse one command line and run it, recording per-command metrics.
pub async fn handle_line(engine: &Engine, line: &str) -> Response {
    let started = Instant::now();
    let (label, response) = match sql::parse_sql(line) {
        Ok(cmd) => {
            let label = observability::command_label(&cmd);
            (label, execute(engine, cmd).await)
        }
        Err(e) => {
            debug!("rejected command: {e}");
            ("unparsed", Response::from(e))
        }
    };

    metrics::counter!(
        observability::COMMANDS_TOTAL,
        "command" => label,
        "status" => response.status.label()
    )
    .increment(1);
    metrics::histogram!(observability::COMMAND_DURATION_SECONDS, "command" => label)
        .record(started.elapsed().as_secs_f64());
    response
}

pub async fn execute(engine: &Engine, cmd: Command) -> Response {
    match cmd {
        Command::InsertCar { id, make, model } => {
            match engine.add_car(Car::new(id, make, model)).await {
                Ok(()) => Response::ok(Status::Created, None),
                Err(e) => e.into(),
            }
        }
        Command::UpdateCar { id, make, model } => {
            match engine.update_car(&id, make, model).await {
                Ok(()) => Response::ok(Status::NoContent, None),
                Err(e) => e.into(),
            }
        }
        Command::DeleteCar { id } => match engine.remove_car(&id).await {
            Ok(_) => Response::ok(Status::NoContent, None),
            Err(e) => e.into(),
        },
        Command::SelectCars { id: None } => {
            Response::ok(Status::Ok, Some(Body::Cars(engine.list_cars().await)))
        }
        Command::SelectCars { id: Some(id) } => match engine.get_car(&id).await {
            Some(car) => Response::ok(Status::Ok, Some(Body::Car(car))),
            None => EngineError::NotFound(id).into(),
        },
        Command::InsertReservation { start, duration } => {
            match engine.reserve_car(TimeWindow::new(start, duration)).await {
                Ok(reservation) => Response::ok(Status::Ok, Some(Body::Reservation(reservation))),
                Err(e) => e.into(),
            }
        }
        Command::SelectReservations { car_id: None } => Response::ok(
            Status::Ok,
            Some(Body::Reservations(engine.list_reservations().await)),
        ),
        Command::SelectReservations { car_id: Some(id) } => Response::ok(
            Status::Ok,
            Some(Body::Reservations(engine.car_reservations(&id).await)),
        ),
        Command::SelectAvailability { start, duration } => {
            match engine.available_cars(&TimeWindow::new(start, duration)).await {
                Ok(cars) => Response::ok(Status::Ok, Some(Body::Cars(cars))),
                Err(e) => e.into(),
            }
        }
    }
}

/// Serve newline-delimited commands until the reader is exhausted.
///
/// Blank lines and `--` comments are skipped. Each command produces exactly one
/// JSON line on `writer`.
pub async fn run<R, W>(engine: &Engine, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        let response = handle_line(engine, line).await;
        if !response.is_success() {
            warn!(status = response.status.code(), "{line}");
        }
        let mut out = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }
    Ok(())
}
