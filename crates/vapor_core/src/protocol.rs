//! Protocolo de frames da porta serial.
//!
//! Cada frame é uma linha de texto ASCII terminada em `\n` com dois campos
//! separados por `;`:
//!
//! ```text
//! ┌───────────────┬───┬──────────────────┐
//! │ vapor (float) │ ; │ movimento (int)  │
//! └───────────────┴───┴──────────────────┘
//! ```
//!
//! Exemplo: `42.5;1`. Movimento é qualquer inteiro; diferente de zero = `true`.

use crate::types::SensorReading;

/// Separador de campos do frame.
pub const FRAME_DELIMITER: char = ';';

/// Número de campos de um frame válido.
pub const FIELD_COUNT: usize = 2;

/// Erros de decodificação de frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Número de campos inválido: {found} (esperado {FIELD_COUNT})")]
    WrongFieldCount { found: usize },

    #[error("Campo '{field}' não numérico: {value:?}")]
    MalformedNumber { field: &'static str, value: String },
}

/// Decodifica uma linha recebida da serial em [`SensorReading`].
///
/// Não há sucesso parcial: ou os dois campos são válidos ou o frame inteiro
/// é rejeitado.
pub fn decode_frame(line: &str) -> Result<SensorReading, DecodeError> {
    let fields: Vec<&str> = line.split(FRAME_DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::WrongFieldCount {
            found: fields.len(),
        });
    }

    let steam_raw = fields[0].trim();
    let steam = steam_raw
        .parse::<f64>()
        .map_err(|_| DecodeError::MalformedNumber {
            field: "steam",
            value: steam_raw.to_string(),
        })?;

    let movement_raw = fields[1].trim();
    let movement = movement_raw
        .parse::<i64>()
        .map_err(|_| DecodeError::MalformedNumber {
            field: "movement",
            value: movement_raw.to_string(),
        })?;

    Ok(SensorReading {
        steam,
        movement: movement != 0,
    })
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_frame() {
        let r = decode_frame("42.5;1").unwrap();
        assert_eq!(r.steam, 42.5);
        assert!(r.movement);
    }

    #[test]
    fn zero_means_no_movement() {
        let r = decode_frame("12;0").unwrap();
        assert_eq!(r.steam, 12.0);
        assert!(!r.movement);
    }

    #[test]
    fn any_nonzero_integer_is_movement() {
        assert!(decode_frame("1.0;7").unwrap().movement);
        assert!(decode_frame("1.0;-1").unwrap().movement);
    }

    #[test]
    fn valid_lines_preserve_values() {
        for (steam, mov) in [(0.0, 0), (79.99, 1), (80.0, 0), (123.456, 1), (-3.5, 0)] {
            let line = format!("{steam};{mov}");
            let r = decode_frame(&line).unwrap();
            assert_eq!(r.steam, steam, "linha {line}");
            assert_eq!(r.movement, mov != 0, "linha {line}");
        }
    }

    #[test]
    fn fields_are_trimmed() {
        let r = decode_frame(" 55.0 ; 1 ").unwrap();
        assert_eq!(r.steam, 55.0);
        assert!(r.movement);
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            decode_frame("42.5"),
            Err(DecodeError::WrongFieldCount { found: 1 })
        );
        assert_eq!(
            decode_frame("42.5;1;0"),
            Err(DecodeError::WrongFieldCount { found: 3 })
        );
        assert_eq!(
            decode_frame(""),
            Err(DecodeError::WrongFieldCount { found: 1 })
        );
    }

    #[test]
    fn rejects_non_numeric_steam() {
        assert!(matches!(
            decode_frame("abc;1"),
            Err(DecodeError::MalformedNumber { field: "steam", .. })
        ));
    }

    #[test]
    fn rejects_non_integer_movement() {
        assert!(matches!(
            decode_frame("42.5;yes"),
            Err(DecodeError::MalformedNumber { field: "movement", .. })
        ));
        assert!(matches!(
            decode_frame("42.5;1.0"),
            Err(DecodeError::MalformedNumber { field: "movement", .. })
        ));
    }

    #[test]
    fn rejects_empty_fields() {
        assert!(decode_frame(";1").is_err());
        assert!(decode_frame("42.5;").is_err());
    }
}
