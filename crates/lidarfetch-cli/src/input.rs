//! Parsing polygon arguments.

use crate::error::CliError;
use lidarfetch_geo::Polygon;

/// Parse `minx,miny,maxx,maxy` into a rectangle.
pub fn parse_bbox(text: &str) -> Result<Polygon, CliError> {
    let values = text
        .split(',')
        .map(|part| parse_number(part, text))
        .collect::<Result<Vec<f64>, CliError>>()?;

    let [min_x, min_y, max_x, max_y] = values[..] else {
        return Err(CliError::Input(format!(
            "bbox needs 4 comma-separated numbers, got {}: '{}'",
            values.len(),
            text
        )));
    };

    if min_x > max_x || min_y > max_y {
        return Err(CliError::Input(format!(
            "bbox minimum exceeds maximum: '{}'",
            text
        )));
    }

    Ok(Polygon::from_bbox(min_x, min_y, max_x, max_y))
}

/// Parse `x y, x y, ...` into a polygon. A closing vertex equal to the first
/// is allowed and dropped.
pub fn parse_polygon(text: &str) -> Result<Polygon, CliError> {
    let vertices = text
        .split(',')
        .map(|pair| {
            let parts: Vec<&str> = pair.split_whitespace().collect();
            match parts[..] {
                [x, y] => Ok((parse_number(x, text)?, parse_number(y, text)?)),
                _ => Err(CliError::Input(format!(
                    "vertex '{}' must be two numbers separated by a space",
                    pair.trim()
                ))),
            }
        })
        .collect::<Result<Vec<(f64, f64)>, CliError>>()?;

    Ok(Polygon::new(vertices))
}

fn parse_number(part: &str, whole: &str) -> Result<f64, CliError> {
    part.trim()
        .parse()
        .map_err(|_| CliError::Input(format!("'{}' is not a number in '{}'", part.trim(), whole)))
}
