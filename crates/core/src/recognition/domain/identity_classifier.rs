use crate::shared::backend::BackendError;

/// Domain interface for a pre-trained face identity classifier.
pub trait IdentityClassifier: Send + Sync {
    /// Identity names, indexed like the probabilities.
    fn classes(&self) -> &[String];

    /// Probability of each class for one face encoding.
    fn predict_proba(&self, encoding: &[f32]) -> Result<Vec<f64>, BackendError>;

    /// Most probable identity and its probability.
    fn classify(&self, encoding: &[f32]) -> Result<(String, f64), BackendError> {
        let proba = self.predict_proba(encoding)?;
        if proba.len() != self.classes().len() {
            return Err(format!(
                "classifier returned {} probabilities for {} classes",
                proba.len(),
                self.classes().len()
            )
            .into());
        }
        let (best, p) = proba
            .iter()
            .enumerate()
            .fold(None, |acc: Option<(usize, f64)>, (i, &p)| match acc {
                Some((_, best)) if best >= p => acc,
                _ => Some((i, p)),
            })
            .ok_or("classifier has no classes")?;
        Ok((self.classes()[best].clone(), p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        classes: Vec<String>,
        proba: Vec<f64>,
    }

    impl IdentityClassifier for FixedClassifier {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn predict_proba(&self, _encoding: &[f32]) -> Result<Vec<f64>, BackendError> {
            Ok(self.proba.clone())
        }
    }

    fn classifier(proba: Vec<f64>) -> FixedClassifier {
        FixedClassifier {
            classes: (0..proba.len()).map(|i| format!("person{i}")).collect(),
            proba,
        }
    }

    #[test]
    fn test_classify_picks_argmax() {
        let (name, p) = classifier(vec![0.1, 0.7, 0.2]).classify(&[0.0; 128]).unwrap();
        assert_eq!(name, "person1");
        assert!((p - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_classify_tie_keeps_first() {
        let (name, _) = classifier(vec![0.5, 0.5]).classify(&[0.0; 128]).unwrap();
        assert_eq!(name, "person0");
    }

    #[test]
    fn test_classify_empty_errors() {
        assert!(classifier(vec![]).classify(&[0.0; 128]).is_err());
    }

    #[test]
    fn test_classify_length_mismatch_errors() {
        let c = FixedClassifier {
            classes: vec!["a".into()],
            proba: vec![0.5, 0.5],
        };
        assert!(c.classify(&[0.0; 128]).is_err());
    }
}
