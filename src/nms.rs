use crate::{Face, Rect};

/// Greedy non-maximum suppression.
#[derive(Copy, Clone, Debug)]
pub struct Nms {
    /// Candidates overlapping a kept one by strictly more than this are dropped.
    pub iou_threshold: f32,
}

impl Default for Nms {
    fn default() -> Self {
        Self { iou_threshold: 0.5 }
    }
}

impl Nms {
    /// Selects the candidates that survive suppression.
    ///
    /// Candidates are visited by descending score. Equal scores keep their
    /// input order, so the earlier candidate wins a tie.
    ///
    /// # Arguments
    ///
    /// * `rects` - Candidate rectangles, all in the same coordinate space.
    /// * `scores` - Candidate scores, parallel to `rects`.
    ///
    /// # Returns
    ///
    /// * `Vec<usize>` - Indices of kept candidates, by descending score.
    pub fn keep_indices(&self, rects: &[Rect], scores: &[f32]) -> Vec<usize> {
        debug_assert_eq!(rects.len(), scores.len());
        let len = rects.len().min(scores.len());

        let mut order: Vec<usize> = (0..len).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut suppressed = vec![false; len];
        let mut kept = Vec::new();
        for (rank, &current) in order.iter().enumerate() {
            if suppressed[current] {
                continue;
            }
            kept.push(current);
            for &other in &order[rank + 1..] {
                if !suppressed[other] && rects[current].iou(&rects[other]) > self.iou_threshold {
                    suppressed[other] = true;
                }
            }
        }

        kept
    }

    /// Suppress non-maxima faces.
    ///
    /// # Arguments
    ///
    /// * `faces` - Faces to suppress.
    ///
    /// # Returns
    ///
    /// * `Vec<Face>` - Kept faces, by descending confidence.
    pub fn suppress_non_maxima(&self, faces: Vec<Face>) -> Vec<Face> {
        let rects: Vec<Rect> = faces.iter().map(|face| face.rect).collect();
        let scores: Vec<f32> = faces.iter().map(|face| face.confidence).collect();
        let keep = self.keep_indices(&rects, &scores);

        let mut faces: Vec<Option<Face>> = faces.into_iter().map(Some).collect();
        keep.into_iter()
            .filter_map(|index| faces[index].take())
            .collect()
    }
}
