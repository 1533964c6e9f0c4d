use super::model::{MealRecord, Totals};

/// Field-wise sum over the day's meals. Always recomputed from scratch.
pub fn compute_totals(meals: &[MealRecord]) -> Totals {
    meals.iter().fold(Totals::default(), |acc, m| Totals {
        calories: acc.calories.saturating_add(m.calories),
        carbs: acc.carbs.saturating_add(m.carbs),
        protein: acc.protein.saturating_add(m.protein),
        fat: acc.fat.saturating_add(m.fat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(id: i64, calories: u32, carbs: u32, protein: u32, fat: u32) -> MealRecord {
        MealRecord {
            id,
            name: format!("meal {id}"),
            kind: "other".into(),
            calories,
            carbs,
            protein,
            fat,
            foods: Vec::new(),
        }
    }

    #[test]
    fn empty_day_has_zero_totals() {
        assert_eq!(compute_totals(&[]), Totals::default());
    }

    #[test]
    fn eggs_and_oats() {
        let meals = [meal(1, 210, 1, 18, 15), meal(2, 150, 27, 5, 3)];
        assert_eq!(
            compute_totals(&meals),
            Totals {
                calories: 360,
                carbs: 28,
                protein: 23,
                fat: 18
            }
        );
    }

    #[test]
    fn each_field_is_summed_independently() {
        let meals: Vec<_> = (0..25)
            .map(|i| meal(i, i as u32 * 10, i as u32, i as u32 * 2, 1))
            .collect();
        let t = compute_totals(&meals);
        assert_eq!(t.calories, meals.iter().map(|m| m.calories).sum::<u32>());
        assert_eq!(t.carbs, meals.iter().map(|m| m.carbs).sum::<u32>());
        assert_eq!(t.protein, meals.iter().map(|m| m.protein).sum::<u32>());
        assert_eq!(t.fat, 25);
    }

    #[test]
    fn overflow_saturates() {
        let meals = [meal(1, u32::MAX, 0, 0, 0), meal(2, 5, 0, 0, 0)];
        assert_eq!(compute_totals(&meals).calories, u32::MAX);
    }
}
