use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString, MultiPolygon};

const PARAM_EPS: f64 = 1e-12;

/// Cuts `line` wherever it meets an exterior or interior ring of `boundary`.
///
/// Each returned piece runs between consecutive boundary contacts, so it lies
/// entirely on one side of the boundary (up to floating-point error). A line
/// that never meets the boundary comes back as a single piece.
pub fn split_at_boundary(line: &LineString<f64>, boundary: &MultiPolygon<f64>) -> Vec<LineString<f64>> {
    let edges: Vec<Line<f64>> = boundary
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .flat_map(|ring| ring.lines())
        .collect();

    let segments: Vec<Line<f64>> = line.lines().collect();
    let Some(first) = segments.first() else {
        return Vec::new();
    };

    let mut pieces = Vec::new();
    let mut current = vec![first.start];
    for (i, segment) in segments.iter().enumerate() {
        let (cuts, ends_on_boundary) = boundary_contacts(segment, &edges);
        for cut in cuts {
            current.push(cut);
            finish_piece(&mut pieces, &mut current, cut);
        }
        current.push(segment.end);
        if ends_on_boundary && i + 1 < segments.len() {
            finish_piece(&mut pieces, &mut current, segment.end);
        }
    }
    if let Some(piece) = into_piece(current) {
        pieces.push(piece);
    }
    pieces
}

/// Interior boundary contacts along `segment`, ordered from its start and
/// deduplicated, plus whether the segment's end vertex sits on the boundary.
fn boundary_contacts(segment: &Line<f64>, edges: &[Line<f64>]) -> (Vec<Coord<f64>>, bool) {
    let mut contacts = Vec::new();
    for edge in edges {
        match line_intersection(*segment, *edge) {
            Some(LineIntersection::SinglePoint { intersection, .. }) => {
                contacts.push((param_along(segment, intersection), intersection));
            }
            Some(LineIntersection::Collinear { intersection }) => {
                contacts.push((param_along(segment, intersection.start), intersection.start));
                contacts.push((param_along(segment, intersection.end), intersection.end));
            }
            None => {}
        }
    }

    let ends_on_boundary = contacts.iter().any(|&(t, _)| t >= 1.0 - PARAM_EPS);
    contacts.retain(|&(t, _)| t > PARAM_EPS && t < 1.0 - PARAM_EPS);
    contacts.sort_by(|a, b| a.0.total_cmp(&b.0));
    contacts.dedup_by(|a, b| (a.0 - b.0).abs() <= PARAM_EPS);
    (contacts.into_iter().map(|(_, c)| c).collect(), ends_on_boundary)
}

fn param_along(segment: &Line<f64>, point: Coord<f64>) -> f64 {
    let d = segment.delta();
    let len2 = d.x * d.x + d.y * d.y;
    if len2 == 0.0 {
        return 0.0;
    }
    let offset = point - segment.start;
    ((offset.x * d.x + offset.y * d.y) / len2).clamp(0.0, 1.0)
}

fn finish_piece(pieces: &mut Vec<LineString<f64>>, current: &mut Vec<Coord<f64>>, restart: Coord<f64>) {
    let done = std::mem::replace(current, vec![restart]);
    if let Some(piece) = into_piece(done) {
        pieces.push(piece);
    }
}

fn into_piece(coords: Vec<Coord<f64>>) -> Option<LineString<f64>> {
    let first = *coords.first()?;
    if coords.iter().all(|c| *c == first) {
        return None;
    }
    Some(LineString::new(coords))
}
