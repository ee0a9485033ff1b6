use burn::data::dataset::Dataset;

use crate::domain::labeled_sequence::LabeledSequence;

pub struct SequenceDataset {
    samples: Vec<LabeledSequence>,
}

impl SequenceDataset {
    pub fn new(samples: Vec<LabeledSequence>) -> Self { Self { samples } }

    /// Number of examples per class, indexed by label
    pub fn class_counts(&self, nb_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; nb_classes];
        for s in &self.samples {
            if let Some(c) = counts.get_mut(s.label) {
                *c += 1;
            }
        }
        counts
    }
}

impl Dataset<LabeledSequence> for SequenceDataset {
    fn get(&self, index: usize) -> Option<LabeledSequence> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_class_counts() {
        let ds = SequenceDataset::new(vec![
            LabeledSequence::new(vec![1], 0),
            LabeledSequence::new(vec![2], 1),
            LabeledSequence::new(vec![3], 1),
        ]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(1), Some(LabeledSequence::new(vec![2], 1)));
        assert_eq!(ds.get(3), None);
        assert_eq!(ds.class_counts(2), vec![1, 2]);
    }
}
